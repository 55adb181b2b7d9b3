/// Discriminant of every syntax tree node kind.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumIter,
    strum::EnumCount,
    strum::IntoStaticStr,
    strum::Display,
)]
pub enum NodeKind {
    Query,
    Sequence,
    Seq,
    Repetition,
    AtomQuery,
    Position,
    NumberedPosition,
    OnePosition,
    MuPart,
    UnionOp,
    MeetOp,
    RepOpt,
    OpenStructTag,
    CloseStructTag,
    Structure,
    AttValList,
    AttValAnd,
    AttVal,
    WithinOrContaining,
    WithinContainingPart,
    WithinNumber,
    AlignedPart,
    GlobPart,
    GlobCond,
    RegExp,
    RegExpRaw,
    RgGrouped,
    RgSimple,
    RgLook,
    RgAlt,
    RgAltVal,
    RgChar,
    RgRange,
    RgRangeSpec,
    RgPosixClass,
    RgOp,
    RgRepeat,
    RgAny,
    RgQM,
    RawString,
    SimpleString,
    AnyLetter,
}

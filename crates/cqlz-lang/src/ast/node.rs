use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use smallvec::SmallVec;
use smol_str::SmolStr;

pub type AttName = SmolStr;

/// Attributes with a small value set (tagsets, dependency labels).
/// Conditions on them tend to match a large share of the corpus.
pub const SMALL_CARDINALITY_ATTRS: &[&str] = &["tag", "pos", "postag", "xpos", "upos", "deprel"];

/// Structures that typically cover the whole corpus in many small pieces.
pub const BIG_STRUCTURES: &[&str] = &["s", "g", "p"];

pub fn is_small_cardinality_attr(name: &str) -> bool {
    SMALL_CARDINALITY_ATTRS.contains(&name)
}

/// The root of a parsed CQL query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub sequence: Option<Sequence>,
    pub glob_part: Option<GlobPart>,
    pub within_or_containing: Vec<WithinOrContaining>,
}

/// `Seq | Seq | ...`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub seqs: Vec<Seq>,
}

/// `!? Repetition Repetition ...`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Seq {
    pub not: bool,
    pub repetitions: Vec<Repetition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Repetition {
    Atom {
        atom: AtomQuery,
        rep_opt: Option<RepOpt>,
    },
    OpenStructTag(OpenStructTag),
    CloseStructTag(CloseStructTag),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomQuery {
    Position(Position),
    Group {
        sequence: Sequence,
        blocks: Vec<WithinOrContaining>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    One(OnePosition),
    Numbered(NumberedPosition),
}

/// `1:[word="x"]`
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedPosition {
    pub number: u32,
    pub position: OnePosition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OnePosition {
    /// `[...]`, `[]` when the list is absent.
    AttValList(Option<AttValList>),
    /// A bare `"regexp"` matched against the default attribute.
    Regex(RegExp),
    /// `~2"regexp"`
    Anchored { number: Option<u32>, regex: RegExp },
    MuKeyword,
    Mu(MuPart),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MuPart {
    Union(UnionOp),
    Meet(MeetOp),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionOp {
    pub left: Box<Position>,
    pub right: Box<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetOp {
    pub left: Box<Position>,
    pub right: Box<Position>,
    pub window: Option<(i32, i32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepOperator {
    ZeroOrMore,
    OneOrMore,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepOpt {
    Operator(RepOperator),
    /// `{from}`, `{from,to}` or `{from,}` when `to` is unbounded.
    Range { from: u32, to: Option<u32> },
}

impl RepOpt {
    pub fn is_unbounded(&self) -> bool {
        matches!(
            self,
            RepOpt::Operator(RepOperator::ZeroOrMore | RepOperator::OneOrMore)
                | RepOpt::Range { to: None, .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenStructTag {
    pub structure: Structure,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseStructTag {
    pub structure: Structure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub att_name: AttName,
    pub att_val_list: Option<AttValList>,
}

impl Structure {
    pub fn is_big_structure(&self) -> bool {
        BIG_STRUCTURES.contains(&self.att_name.as_str())
    }
}

/// `AttValAnd | AttValAnd | ...`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttValList {
    pub items: Vec<AttValAnd>,
}

impl AttValList {
    pub fn num_att_vals(&self) -> usize {
        self.items.iter().map(|and| and.items.len()).sum()
    }
}

/// `AttVal & AttVal & ...`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttValAnd {
    pub items: SmallVec<[AttVal; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttOp {
    Eq,
    Leq,
    Geq,
    Teq(Option<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsKeyword {
    Ws,
    Term,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WsTermArgs {
    Numbers(u32, u32),
    Regexes(RegExp, RegExp, RegExp),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttVal {
    /// `att == "literal"`
    Raw {
        att_name: AttName,
        not: bool,
        value: RawString,
    },
    /// `att = "regexp"`, `att <= "..."`, `att ~2 "..."`
    Regex {
        att_name: AttName,
        not: bool,
        op: AttOp,
        regex: RegExp,
    },
    /// `#3-5`
    PosNumRange { from: u32, to: u32 },
    /// `#3`
    PosNum(u32),
    Not(Box<AttVal>),
    Group(AttValList),
    WsTerm { keyword: WsKeyword, args: WsTermArgs },
    Swap { number: u32, list: AttValList },
    Ccoll { from: u32, to: u32, list: AttValList },
}

impl AttVal {
    pub fn att_name(&self) -> Option<&str> {
        match self {
            AttVal::Raw { att_name, .. } | AttVal::Regex { att_name, .. } => Some(att_name),
            _ => None,
        }
    }

    pub fn is_negation(&self) -> bool {
        match self {
            AttVal::Raw { not, .. } | AttVal::Regex { not, .. } => *not,
            AttVal::Not(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithinKeyword {
    Within,
    Containing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithinOrContaining {
    pub not: bool,
    pub keyword: WithinKeyword,
    pub part: WithinContainingPart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WithinContainingPart {
    Sequence(Sequence),
    Number(WithinNumber),
    Aligned { not: bool, part: AlignedPart },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithinNumber {
    pub value: u32,
}

/// `corpus_name: Sequence` searched in an aligned corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPart {
    pub att_name: AttName,
    pub sequence: Sequence,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobPart {
    pub conds: Vec<GlobCond>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqOp {
    Eq,
    Leq,
    Geq,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlobCond {
    /// `1.tag = 2.tag`
    AttrEq {
        left: u32,
        left_att: AttName,
        not: bool,
        right: u32,
        right_att: AttName,
    },
    /// `f(1.word) > 3`
    Freq {
        number: u32,
        att_name: AttName,
        not: bool,
        op: FreqOp,
        value: u32,
    },
}

/// `RegExpRaw | RegExpRaw | ...`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegExp {
    pub alternatives: SmallVec<[RegExpRaw; 1]>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegExpRaw {
    pub items: Vec<RegExpItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegExpItem {
    Look(RgLook),
    Grouped(RgGrouped),
    Simple(RgSimple),
}

/// Lookarounds and inline flags, kept verbatim: `(?=...)`, `(?i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RgLook {
    pub value: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RgGrouped {
    pub alternatives: Vec<RegExpRaw>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RgSimple {
    pub items: Vec<RgSimpleItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RgSimpleItem {
    Range(RgRange),
    Char(RgChar),
    Alt(RgAlt),
    PosixClass(RgPosixClass),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RgChar {
    Literal { value: SmolStr, unicode_class: bool },
    Op(RgOp),
    Repeat(RgRepeat),
    Any(RgAny),
    QuestionMark(RgQM),
}

impl RgChar {
    pub fn is_constant(&self) -> bool {
        matches!(self, RgChar::Literal { .. })
    }

    pub fn is_unicode_class(&self) -> bool {
        matches!(
            self,
            RgChar::Literal {
                unicode_class: true,
                ..
            }
        )
    }
}

/// Anchors `^` and `$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgOp {
    pub value: char,
}

/// `*` or `+`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgRepeat {
    pub value: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgAny;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgQM;

/// A bracketed character class `[abc]`, `[^a-z]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RgAlt {
    pub not: bool,
    pub values: Vec<RgAltVal>,
}

impl RgAlt {
    pub fn num_items(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RgAltVal {
    Char(RgChar),
    Escaped(SmolStr),
    Range { from: char, to: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgRange {
    pub spec: RgRangeSpec,
}

/// `{from}`, `{from,to}` or `{from,}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgRangeSpec {
    pub from: u32,
    pub to: Option<u32>,
}

/// `[[:alpha:]]`
#[derive(Debug, Clone, PartialEq)]
pub struct RgPosixClass {
    pub name: SmolStr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawString {
    pub value: SimpleString,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleString {
    pub value: SmolStr,
}

impl SimpleString {
    pub fn uppercase_ratio(&self) -> f64 {
        let total = self.value.chars().count();
        if total == 0 {
            return 0.0;
        }
        let upper = self.value.chars().filter(|c| c.is_uppercase()).count();
        upper as f64 / total as f64
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2 + self.within_or_containing.len());
        if let Some(sequence) = &self.sequence {
            parts.push(sequence.to_string());
        }
        if let Some(glob) = &self.glob_part {
            parts.push(format!("& {glob}"));
        }
        parts.extend(self.within_or_containing.iter().map(ToString::to_string));
        write!(f, "{}", parts.join(" "))
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.seqs.iter().join(" | "))
    }
}

impl Display for Seq {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.not {
            write!(f, "!")?;
        }
        write!(f, "{}", self.repetitions.iter().join(" "))
    }
}

impl Display for Repetition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Repetition::Atom { atom, rep_opt } => {
                write!(f, "{atom}")?;
                if let Some(rep_opt) = rep_opt {
                    write!(f, "{rep_opt}")?;
                }
                Ok(())
            }
            Repetition::OpenStructTag(tag) => write!(f, "{tag}"),
            Repetition::CloseStructTag(tag) => write!(f, "{tag}"),
        }
    }
}

impl Display for AtomQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AtomQuery::Position(position) => write!(f, "{position}"),
            AtomQuery::Group { sequence, blocks } => {
                write!(f, "({sequence}")?;
                for block in blocks {
                    write!(f, " {block}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Position::One(position) => write!(f, "{position}"),
            Position::Numbered(position) => write!(f, "{position}"),
        }
    }
}

impl Display for NumberedPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.number, self.position)
    }
}

impl Display for OnePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OnePosition::AttValList(None) => write!(f, "[]"),
            OnePosition::AttValList(Some(list)) => write!(f, "[{list}]"),
            OnePosition::Regex(regex) => write!(f, "\"{regex}\""),
            OnePosition::Anchored {
                number: Some(n),
                regex,
            } => write!(f, "~{n}\"{regex}\""),
            OnePosition::Anchored {
                number: None,
                regex,
            } => write!(f, "~\"{regex}\""),
            OnePosition::MuKeyword => write!(f, "mu"),
            OnePosition::Mu(mu) => write!(f, "{mu}"),
        }
    }
}

impl Display for MuPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MuPart::Union(op) => write!(f, "{op}"),
            MuPart::Meet(op) => write!(f, "{op}"),
        }
    }
}

impl Display for UnionOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(union {} {})", self.left, self.right)
    }
}

impl Display for MeetOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.window {
            Some((from, to)) => write!(f, "(meet {} {} {from} {to})", self.left, self.right),
            None => write!(f, "(meet {} {})", self.left, self.right),
        }
    }
}

impl Display for RepOpt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RepOpt::Operator(RepOperator::ZeroOrMore) => write!(f, "*"),
            RepOpt::Operator(RepOperator::OneOrMore) => write!(f, "+"),
            RepOpt::Operator(RepOperator::Optional) => write!(f, "?"),
            RepOpt::Range { from, to: None } => write!(f, "{{{from},}}"),
            RepOpt::Range { from, to: Some(to) } if from == to => write!(f, "{{{from}}}"),
            RepOpt::Range { from, to: Some(to) } => write!(f, "{{{from},{to}}}"),
        }
    }
}

impl Display for OpenStructTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.self_closing {
            write!(f, "<{}/>", self.structure)
        } else {
            write!(f, "<{}>", self.structure)
        }
    }
}

impl Display for CloseStructTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "</{}>", self.structure)
    }
}

impl Display for Structure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.att_val_list {
            Some(list) => write!(f, "{} {list}", self.att_name),
            None => write!(f, "{}", self.att_name),
        }
    }
}

impl Display for AttValList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.items.iter().join(" | "))
    }
}

impl Display for AttValAnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.items.iter().join(" & "))
    }
}

impl Display for AttOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AttOp::Eq => write!(f, "="),
            AttOp::Leq => write!(f, "<="),
            AttOp::Geq => write!(f, ">="),
            AttOp::Teq(Some(n)) => write!(f, "~{n}"),
            AttOp::Teq(None) => write!(f, "~"),
        }
    }
}

impl Display for AttVal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let bang = |not: &bool| if *not { "!" } else { "" };
        match self {
            AttVal::Raw {
                att_name,
                not,
                value,
            } => write!(f, "{att_name}{}=={value}", bang(not)),
            AttVal::Regex {
                att_name,
                not,
                op,
                regex,
            } => write!(f, "{att_name}{}{op}\"{regex}\"", bang(not)),
            AttVal::PosNumRange { from, to } => write!(f, "#{from}-{to}"),
            AttVal::PosNum(n) => write!(f, "#{n}"),
            AttVal::Not(inner) => write!(f, "!{inner}"),
            AttVal::Group(list) => write!(f, "({list})"),
            AttVal::WsTerm { keyword, args } => {
                let keyword = match keyword {
                    WsKeyword::Ws => "ws",
                    WsKeyword::Term => "term",
                };
                match args {
                    WsTermArgs::Numbers(a, b) => write!(f, "{keyword}({a}, {b})"),
                    WsTermArgs::Regexes(a, b, c) => {
                        write!(f, "{keyword}(\"{a}\", \"{b}\", \"{c}\")")
                    }
                }
            }
            AttVal::Swap { number, list } => write!(f, "swap({number}, {list})"),
            AttVal::Ccoll { from, to, list } => write!(f, "ccoll({from}, {to}, {list})"),
        }
    }
}

impl Display for WithinOrContaining {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.not {
            write!(f, "!")?;
        }
        match self.keyword {
            WithinKeyword::Within => write!(f, "within {}", self.part),
            WithinKeyword::Containing => write!(f, "containing {}", self.part),
        }
    }
}

impl Display for WithinContainingPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WithinContainingPart::Sequence(sequence) => write!(f, "{sequence}"),
            WithinContainingPart::Number(number) => write!(f, "{number}"),
            WithinContainingPart::Aligned { not: true, part } => write!(f, "!{part}"),
            WithinContainingPart::Aligned { not: false, part } => write!(f, "{part}"),
        }
    }
}

impl Display for WithinNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Display for AlignedPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.att_name, self.sequence)
    }
}

impl Display for GlobPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.conds.iter().join(" & "))
    }
}

impl Display for FreqOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FreqOp::Eq => write!(f, "="),
            FreqOp::Leq => write!(f, "<="),
            FreqOp::Geq => write!(f, ">="),
            FreqOp::Lt => write!(f, "<"),
            FreqOp::Gt => write!(f, ">"),
        }
    }
}

impl Display for GlobCond {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GlobCond::AttrEq {
                left,
                left_att,
                not,
                right,
                right_att,
            } => {
                let op = if *not { "!=" } else { "=" };
                write!(f, "{left}.{left_att} {op} {right}.{right_att}")
            }
            GlobCond::Freq {
                number,
                att_name,
                not,
                op,
                value,
            } => {
                let bang = if *not { "!" } else { "" };
                write!(f, "f({number}.{att_name}) {bang}{op} {value}")
            }
        }
    }
}

impl Display for RegExp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alternatives.iter().join("|"))
    }
}

impl Display for RegExpRaw {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.items.iter().try_for_each(|item| write!(f, "{item}"))
    }
}

impl Display for RegExpItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegExpItem::Look(look) => write!(f, "{look}"),
            RegExpItem::Grouped(grouped) => write!(f, "{grouped}"),
            RegExpItem::Simple(simple) => write!(f, "{simple}"),
        }
    }
}

impl Display for RgLook {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Display for RgGrouped {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.alternatives.iter().join("|"))
    }
}

impl Display for RgSimple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.items.iter().try_for_each(|item| write!(f, "{item}"))
    }
}

impl Display for RgSimpleItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RgSimpleItem::Range(range) => write!(f, "{range}"),
            RgSimpleItem::Char(ch) => write!(f, "{ch}"),
            RgSimpleItem::Alt(alt) => write!(f, "{alt}"),
            RgSimpleItem::PosixClass(class) => write!(f, "{class}"),
        }
    }
}

impl Display for RgChar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RgChar::Literal { value, .. } => write!(f, "{value}"),
            RgChar::Op(op) => write!(f, "{op}"),
            RgChar::Repeat(repeat) => write!(f, "{repeat}"),
            RgChar::Any(any) => write!(f, "{any}"),
            RgChar::QuestionMark(qm) => write!(f, "{qm}"),
        }
    }
}

impl Display for RgOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Display for RgRepeat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Display for RgAny {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, ".")
    }
}

impl Display for RgQM {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "?")
    }
}

impl Display for RgAlt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        if self.not {
            write!(f, "^")?;
        }
        self.values.iter().try_for_each(|v| write!(f, "{v}"))?;
        write!(f, "]")
    }
}

impl Display for RgAltVal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RgAltVal::Char(ch) => write!(f, "{ch}"),
            RgAltVal::Escaped(value) => write!(f, "{value}"),
            RgAltVal::Range { from, to } => write!(f, "{from}-{to}"),
        }
    }
}

impl Display for RgRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec)
    }
}

impl Display for RgRangeSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.to {
            None => write!(f, "{{{},}}", self.from),
            Some(to) if to == self.from => write!(f, "{{{to}}}"),
            Some(to) => write!(f, "{{{},{to}}}", self.from),
        }
    }
}

impl Display for RgPosixClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[[:{}:]]", self.name)
    }
}

impl Display for RawString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value)
    }
}

impl Display for SimpleString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.value.chars().try_for_each(|c| match c {
            '"' | '\\' => write!(f, "\\{c}"),
            _ => write!(f, "{c}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use smallvec::smallvec;

    use super::*;

    fn literal(value: &str) -> RgSimpleItem {
        RgSimpleItem::Char(RgChar::Literal {
            value: value.into(),
            unicode_class: false,
        })
    }

    #[rstest]
    #[case(RepOpt::Operator(RepOperator::ZeroOrMore), "*", true)]
    #[case(RepOpt::Operator(RepOperator::Optional), "?", false)]
    #[case(RepOpt::Range { from: 2, to: Some(2) }, "{2}", false)]
    #[case(RepOpt::Range { from: 2, to: Some(5) }, "{2,5}", false)]
    #[case(RepOpt::Range { from: 2, to: None }, "{2,}", true)]
    fn test_rep_opt(#[case] rep_opt: RepOpt, #[case] text: &str, #[case] unbounded: bool) {
        assert_eq!(rep_opt.to_string(), text);
        assert_eq!(rep_opt.is_unbounded(), unbounded);
    }

    #[test]
    fn test_att_val_text() {
        let regex = RegExp {
            alternatives: smallvec![RegExpRaw {
                items: vec![RegExpItem::Simple(RgSimple {
                    items: vec![literal("N"), RgSimpleItem::Char(RgChar::Any(RgAny))],
                })],
            }],
        };
        let att_val = AttVal::Regex {
            att_name: "tag".into(),
            not: true,
            op: AttOp::Eq,
            regex,
        };

        assert_eq!(att_val.to_string(), "tag!=\"N.\"");
        assert_eq!(att_val.att_name(), Some("tag"));
        assert!(att_val.is_negation());
    }

    #[rstest]
    #[case("s", true)]
    #[case("doc", false)]
    fn test_big_structure(#[case] name: &str, #[case] expected: bool) {
        let structure = Structure {
            att_name: name.into(),
            att_val_list: None,
        };
        assert_eq!(structure.is_big_structure(), expected);
    }

    #[rstest]
    #[case("ABcd", 0.5)]
    #[case("", 0.0)]
    fn test_uppercase_ratio(#[case] value: &str, #[case] expected: f64) {
        let s = SimpleString {
            value: value.into(),
        };
        assert_eq!(s.uppercase_ratio(), expected);
    }

    #[test]
    fn test_simple_string_escapes_quotes() {
        let raw = RawString {
            value: SimpleString {
                value: "a\"b".into(),
            },
        };
        assert_eq!(raw.to_string(), r#""a\"b""#);
    }
}

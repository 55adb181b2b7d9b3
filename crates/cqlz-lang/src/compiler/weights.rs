//! Weight slots and the node-kind → slot table.
//!
//! [`WeightSlot`] enumerates every tunable constant of the cost model, its
//! variant count is the dimension of a weight vector and of an optimizer
//! chromosome. [`NodeKind::rule`] states how each node kind turns the values
//! of its children into one value and which slot scales it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};

use super::error::CompileError;
use crate::ast::NodeKind;
use crate::optimizer::ConfigError;

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
pub enum WeightSlot {
    WithinContainingPart,
    GlobCond,
    Structure,
    AttValList,
    NumberedPosition,
    RegExp,
    MuPart,
    Repetition,
    AtomQuery,
    RepOpt,
    OpenStructTag,
    CloseStructTag,
    AlignedPart,
    AttValAnd,
    AttVal,
    WithinNumber,
    RegExpRaw,
    RawString,
    SimpleString,
    RgGrouped,
    RgSimple,
    RgPosixClass,
    RgLook,
    RgAlt,
    RgRange,
    RgRangeSpec,
    AnyLetter,
    RgOp,
    RgAltVal,
    RgAny,
    RgQM,
    RgRepeat,
    /// A concrete (literal) regex character.
    RgChar,
    /// `\p{..}` unicode property classes.
    UnicodeClass,
    /// `[]`
    AnyPosition,
    /// `{n,m}` and `?` on a position.
    BoundedRepOpt,
    /// Extra factor for conditions on small-cardinality attributes.
    SmallCardAttr,
}

impl WeightSlot {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Slots not named by [`NodeKind::rule`], selected by the variant of a node.
pub const VARIANT_SLOTS: &[WeightSlot] = &[
    WeightSlot::RgChar,
    WeightSlot::UnicodeClass,
    WeightSlot::AnyPosition,
    WeightSlot::BoundedRepOpt,
    WeightSlot::SmallCardAttr,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    Add,
    Multiply,
}

/// How one node kind is compiled.
///
/// On entry the node pushes `constant` if set. After the children, the `k`
/// values it holds are folded with `k - 1` `combine` instructions, capped by
/// `Clamp1` when `clamp` is set and multiplied by `scale` unless a constant was
/// pushed. A node holding no value contributes nothing. A negated `AttVal`
/// is additionally capped before `NegateProbability`, outside this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub combine: Combine,
    pub scale: Option<WeightSlot>,
    pub constant: Option<WeightSlot>,
    pub clamp: bool,
}

impl Rule {
    pub const ADD: Rule = Rule {
        combine: Combine::Add,
        scale: None,
        constant: None,
        clamp: false,
    };

    pub const MUL: Rule = Rule {
        combine: Combine::Multiply,
        scale: None,
        constant: None,
        clamp: false,
    };

    pub const fn leaf(slot: WeightSlot) -> Rule {
        Rule {
            constant: Some(slot),
            ..Rule::MUL
        }
    }

    pub const fn scaled(self, slot: WeightSlot) -> Rule {
        Rule {
            scale: Some(slot),
            ..self
        }
    }

    pub const fn clamped(self) -> Rule {
        Rule {
            clamp: true,
            ..self
        }
    }
}

impl NodeKind {
    pub const fn rule(self) -> Rule {
        use WeightSlot as W;

        match self {
            NodeKind::Query => Rule::MUL,
            NodeKind::Sequence => Rule::ADD,
            NodeKind::Seq => Rule::MUL,
            NodeKind::Repetition => Rule::MUL.scaled(W::Repetition),
            NodeKind::AtomQuery => Rule::MUL.scaled(W::AtomQuery),
            NodeKind::Position => Rule::MUL,
            NodeKind::NumberedPosition => Rule::MUL.scaled(W::NumberedPosition),
            NodeKind::OnePosition => Rule::MUL,
            NodeKind::MuPart => Rule::MUL.scaled(W::MuPart),
            NodeKind::UnionOp => Rule::ADD,
            NodeKind::MeetOp => Rule::MUL,
            NodeKind::RepOpt => Rule::leaf(W::RepOpt),
            NodeKind::OpenStructTag => Rule::MUL.scaled(W::OpenStructTag),
            NodeKind::CloseStructTag => Rule::MUL.scaled(W::CloseStructTag),
            NodeKind::Structure => Rule::leaf(W::Structure),
            NodeKind::AttValList => Rule::ADD.scaled(W::AttValList),
            NodeKind::AttValAnd => Rule::MUL.scaled(W::AttValAnd),
            NodeKind::AttVal => Rule::MUL.scaled(W::AttVal),
            NodeKind::WithinOrContaining => Rule::MUL,
            NodeKind::WithinContainingPart => Rule::MUL.scaled(W::WithinContainingPart),
            NodeKind::WithinNumber => Rule::leaf(W::WithinNumber),
            NodeKind::AlignedPart => Rule::MUL.scaled(W::AlignedPart),
            NodeKind::GlobPart => Rule::MUL,
            NodeKind::GlobCond => Rule::leaf(W::GlobCond),
            NodeKind::RegExp => Rule::ADD.scaled(W::RegExp),
            NodeKind::RegExpRaw => Rule::MUL.scaled(W::RegExpRaw),
            NodeKind::RgGrouped => Rule::ADD.clamped().scaled(W::RgGrouped),
            NodeKind::RgSimple => Rule::MUL.scaled(W::RgSimple),
            NodeKind::RgLook => Rule::leaf(W::RgLook),
            NodeKind::RgAlt => Rule::ADD.scaled(W::RgAlt),
            NodeKind::RgAltVal => Rule::MUL.scaled(W::RgAltVal),
            NodeKind::RgChar => Rule::MUL,
            NodeKind::RgRange => Rule::MUL.scaled(W::RgRange),
            NodeKind::RgRangeSpec => Rule::leaf(W::RgRangeSpec),
            NodeKind::RgPosixClass => Rule::leaf(W::RgPosixClass),
            NodeKind::RgOp => Rule::leaf(W::RgOp),
            NodeKind::RgRepeat => Rule::leaf(W::RgRepeat),
            NodeKind::RgAny => Rule::leaf(W::RgAny),
            NodeKind::RgQM => Rule::leaf(W::RgQM),
            NodeKind::RawString => Rule::MUL.scaled(W::RawString),
            NodeKind::SimpleString => Rule::MUL.scaled(W::SimpleString),
            NodeKind::AnyLetter => Rule::leaf(W::AnyLetter),
        }
    }
}

/// One value per [`WeightSlot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Weights(Vec<f64>);

impl Weights {
    pub const DIMENSION: usize = WeightSlot::COUNT;

    pub fn uniform(value: f64) -> Self {
        Self(vec![value; Self::DIMENSION])
    }

    pub fn from_vec(values: Vec<f64>) -> Result<Self, CompileError> {
        if values.len() != Self::DIMENSION {
            return Err(CompileError::InvalidDimension {
                expected: Self::DIMENSION,
                found: values.len(),
            });
        }
        Ok(Self(values))
    }

    #[inline(always)]
    pub fn get(&self, slot: WeightSlot) -> f64 {
        self.0[slot.index()]
    }

    pub fn set(&mut self, slot: WeightSlot, value: f64) {
        self.0[slot.index()] = value;
    }

    pub fn with(mut self, slot: WeightSlot, value: f64) -> Self {
        self.set(slot, value);
        self
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn named(&self) -> impl Iterator<Item = (WeightSlot, f64)> + '_ {
        WeightSlot::iter().zip(self.0.iter().copied())
    }

    /// Reads a JSON array holding one number per slot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl TryFrom<Vec<f64>> for Weights {
    type Error = CompileError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_vec(values)
    }
}

impl From<Weights> for Vec<f64> {
    fn from(weights: Weights) -> Self {
        weights.0
    }
}

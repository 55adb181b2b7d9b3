//! Regex exhaustion scores and their propagation to ancestor nodes.
//!
//! A regular expression that must scan a large part of the lexicon (a leading
//! `.*`, an open repetition) makes the whole query expensive. The score of
//! such an `RgSimple` is redistributed to every ancestor with a weight that
//! decays with the square of the distance. The results live in an
//! [`EffectTable`] keyed by node id, the tree itself is never modified.

use itertools::Itertools;
use rustc_hash::FxHashMap;

use super::node::{Query, RgChar, RgSimple, RgSimpleItem};
use super::visit::{NodeId, NodeRef, PathEntry, walk_with_path};

pub const LEADING_WILDCARD_SCORE: u32 = 40;
pub const WILDCARD_SCORE: u32 = 15;

impl RgSimple {
    /// Estimates how much of the lexicon the expression has to scan.
    ///
    /// A wildcard (`.` followed by `*` or `+`) at the very beginning prevents
    /// any prefix lookup and scores [`LEADING_WILDCARD_SCORE`]. A wildcard
    /// elsewhere or a `{n,m}` range scores [`WILDCARD_SCORE`].
    pub fn exhaustion_score(&self) -> u32 {
        let mut has_wildcard = false;
        for (i, (item, next)) in self.items.iter().tuple_windows().enumerate() {
            if is_wildcard(item, next) {
                if i == 0 {
                    return LEADING_WILDCARD_SCORE;
                }
                has_wildcard = true;
            }
        }

        let has_range = self
            .items
            .iter()
            .any(|item| matches!(item, RgSimpleItem::Range(_)));

        if has_wildcard || has_range {
            WILDCARD_SCORE
        } else {
            0
        }
    }
}

fn is_wildcard(item: &RgSimpleItem, next: &RgSimpleItem) -> bool {
    matches!(
        (item, next),
        (
            RgSimpleItem::Char(RgChar::Any(_)),
            RgSimpleItem::Char(RgChar::Repeat(_))
        )
    )
}

/// Accumulated effect per node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTable {
    effects: FxHashMap<NodeId, f64>,
}

impl EffectTable {
    /// Runs the single propagation pass over `query`.
    ///
    /// The node carrying a non-zero exhaustion score receives it in full, its
    /// ancestor at distance `j` (the parent being at distance 2) receives
    /// `score / j²`.
    pub fn compute(query: &Query) -> Self {
        let mut table = Self::default();

        walk_with_path(query, &mut |path: &[PathEntry<'_>]| {
            let Some((last, ancestors)) = path.split_last() else {
                return;
            };
            let NodeRef::RgSimple(simple) = last.node else {
                return;
            };
            let score = simple.exhaustion_score() as f64;
            if score == 0.0 {
                return;
            }

            table.add(last.id, score);
            for (distance, ancestor) in (2u32..).zip(ancestors.iter().rev()) {
                let distance = distance as f64;
                table.add(ancestor.id, score / (distance * distance));
            }
        });

        table
    }

    fn add(&mut self, id: NodeId, value: f64) {
        *self.effects.entry(id).or_insert(0.0) += value;
    }

    pub fn get(&self, id: NodeId) -> f64 {
        self.effects.get(&id).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.effects.values().sum()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Entries ordered by node id.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.effects
            .iter()
            .map(|(id, effect)| (*id, *effect))
            .sorted_by_key(|(id, _)| *id)
    }
}

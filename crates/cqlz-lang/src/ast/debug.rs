//! Human-readable dumps of a syntax tree.

use std::fmt::{self, Display, Formatter};

use super::effect::EffectTable;
use super::node::Query;
use super::visit::{NodeRef, Visitor, walk};

/// Dumps the tree one node per line, indented by depth.
///
/// Output format:
/// ```text
/// 0000 Query [word=".*"]
/// 0001   Sequence [word=".*"]
/// ...
/// 0012               RgSimple .* (effect: 40.000)
/// ```
pub fn dump_tree(query: &Query, effects: Option<&EffectTable>) -> String {
    TreeDump { query, effects }.to_string()
}

struct TreeDump<'a> {
    query: &'a Query,
    effects: Option<&'a EffectTable>,
}

impl Display for TreeDump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut lines = Lines {
            next_id: 0,
            depth: 0,
            effects: self.effects,
            out: f,
            result: Ok(()),
        };
        walk(self.query, &mut lines);
        lines.result
    }
}

struct Lines<'f, 'g> {
    next_id: usize,
    depth: usize,
    effects: Option<&'f EffectTable>,
    out: &'f mut Formatter<'g>,
    result: fmt::Result,
}

impl<'a> Visitor<'a> for Lines<'_, '_> {
    fn enter(&mut self, _parent: Option<NodeRef<'a>>, node: NodeRef<'a>) {
        let id = self.next_id;
        self.next_id += 1;

        if self.result.is_ok() {
            let kind: &'static str = node.kind().into();
            let effect = self.effects.map(|t| t.get(id)).unwrap_or(0.0);
            self.result = if effect != 0.0 {
                writeln!(
                    self.out,
                    "{id:04} {}{kind} {} (effect: {effect:.3})",
                    "  ".repeat(self.depth),
                    node.text()
                )
            } else {
                writeln!(
                    self.out,
                    "{id:04} {}{kind} {}",
                    "  ".repeat(self.depth),
                    node.text()
                )
            };
        }
        self.depth += 1;
    }

    fn leave(&mut self, _parent: Option<NodeRef<'a>>, _node: NodeRef<'a>) {
        self.depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::ast::node::*;

    #[test]
    fn test_dump_tree() {
        let query = Query {
            sequence: Some(Sequence {
                seqs: vec![Seq {
                    not: false,
                    repetitions: vec![Repetition::Atom {
                        atom: AtomQuery::Position(Position::One(OnePosition::Regex(RegExp {
                            alternatives: smallvec![RegExpRaw {
                                items: vec![RegExpItem::Simple(RgSimple {
                                    items: vec![
                                        RgSimpleItem::Char(RgChar::Any(RgAny)),
                                        RgSimpleItem::Char(RgChar::Repeat(RgRepeat {
                                            value: '+'
                                        })),
                                    ],
                                })],
                            }],
                        }))),
                        rep_opt: None,
                    }],
                }],
            }),
            ..Default::default()
        };
        let effects = EffectTable::compute(&query);
        let dump = dump_tree(&query, Some(&effects));
        let lines = dump.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "0000 Query \".+\" (effect: 0.400)");
        assert_eq!(lines[9], "0009                   RgSimple .+ (effect: 40.000)");
        assert_eq!(lines[11], "0011                       RgAny .");
        assert_eq!(lines.len(), 14);
    }

    #[test]
    fn test_dump_tree_without_effects() {
        let dump = dump_tree(&Query::default(), None);
        assert_eq!(dump, "0000 Query \n");
    }
}

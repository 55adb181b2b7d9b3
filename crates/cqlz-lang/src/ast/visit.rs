//! Traversal of the syntax tree.
//!
//! Children are always visited in the order they appear in the query text.
//! The compiler interleaves its instructions relying on that order, so
//! [`NodeRef::children`] is the single place where it is defined.

use smallvec::{SmallVec, smallvec};

use super::kind::NodeKind;
use super::node::*;

/// Pre-order index of a node within one query.
pub type NodeId = usize;

pub type Children<'a> = SmallVec<[NodeRef<'a>; 4]>;

/// A borrowed view of any node in the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Query(&'a Query),
    Sequence(&'a Sequence),
    Seq(&'a Seq),
    Repetition(&'a Repetition),
    AtomQuery(&'a AtomQuery),
    Position(&'a Position),
    NumberedPosition(&'a NumberedPosition),
    OnePosition(&'a OnePosition),
    MuPart(&'a MuPart),
    UnionOp(&'a UnionOp),
    MeetOp(&'a MeetOp),
    RepOpt(&'a RepOpt),
    OpenStructTag(&'a OpenStructTag),
    CloseStructTag(&'a CloseStructTag),
    Structure(&'a Structure),
    AttValList(&'a AttValList),
    AttValAnd(&'a AttValAnd),
    AttVal(&'a AttVal),
    WithinOrContaining(&'a WithinOrContaining),
    WithinContainingPart(&'a WithinContainingPart),
    WithinNumber(&'a WithinNumber),
    AlignedPart(&'a AlignedPart),
    GlobPart(&'a GlobPart),
    GlobCond(&'a GlobCond),
    RegExp(&'a RegExp),
    RegExpRaw(&'a RegExpRaw),
    RgGrouped(&'a RgGrouped),
    RgSimple(&'a RgSimple),
    RgLook(&'a RgLook),
    RgAlt(&'a RgAlt),
    RgAltVal(&'a RgAltVal),
    RgChar(&'a RgChar),
    RgRange(&'a RgRange),
    RgRangeSpec(&'a RgRangeSpec),
    RgPosixClass(&'a RgPosixClass),
    RgOp(&'a RgOp),
    RgRepeat(&'a RgRepeat),
    RgAny(&'a RgAny),
    RgQM(&'a RgQM),
    RawString(&'a RawString),
    SimpleString(&'a SimpleString),
    AnyLetter(char),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Query(_) => NodeKind::Query,
            NodeRef::Sequence(_) => NodeKind::Sequence,
            NodeRef::Seq(_) => NodeKind::Seq,
            NodeRef::Repetition(_) => NodeKind::Repetition,
            NodeRef::AtomQuery(_) => NodeKind::AtomQuery,
            NodeRef::Position(_) => NodeKind::Position,
            NodeRef::NumberedPosition(_) => NodeKind::NumberedPosition,
            NodeRef::OnePosition(_) => NodeKind::OnePosition,
            NodeRef::MuPart(_) => NodeKind::MuPart,
            NodeRef::UnionOp(_) => NodeKind::UnionOp,
            NodeRef::MeetOp(_) => NodeKind::MeetOp,
            NodeRef::RepOpt(_) => NodeKind::RepOpt,
            NodeRef::OpenStructTag(_) => NodeKind::OpenStructTag,
            NodeRef::CloseStructTag(_) => NodeKind::CloseStructTag,
            NodeRef::Structure(_) => NodeKind::Structure,
            NodeRef::AttValList(_) => NodeKind::AttValList,
            NodeRef::AttValAnd(_) => NodeKind::AttValAnd,
            NodeRef::AttVal(_) => NodeKind::AttVal,
            NodeRef::WithinOrContaining(_) => NodeKind::WithinOrContaining,
            NodeRef::WithinContainingPart(_) => NodeKind::WithinContainingPart,
            NodeRef::WithinNumber(_) => NodeKind::WithinNumber,
            NodeRef::AlignedPart(_) => NodeKind::AlignedPart,
            NodeRef::GlobPart(_) => NodeKind::GlobPart,
            NodeRef::GlobCond(_) => NodeKind::GlobCond,
            NodeRef::RegExp(_) => NodeKind::RegExp,
            NodeRef::RegExpRaw(_) => NodeKind::RegExpRaw,
            NodeRef::RgGrouped(_) => NodeKind::RgGrouped,
            NodeRef::RgSimple(_) => NodeKind::RgSimple,
            NodeRef::RgLook(_) => NodeKind::RgLook,
            NodeRef::RgAlt(_) => NodeKind::RgAlt,
            NodeRef::RgAltVal(_) => NodeKind::RgAltVal,
            NodeRef::RgChar(_) => NodeKind::RgChar,
            NodeRef::RgRange(_) => NodeKind::RgRange,
            NodeRef::RgRangeSpec(_) => NodeKind::RgRangeSpec,
            NodeRef::RgPosixClass(_) => NodeKind::RgPosixClass,
            NodeRef::RgOp(_) => NodeKind::RgOp,
            NodeRef::RgRepeat(_) => NodeKind::RgRepeat,
            NodeRef::RgAny(_) => NodeKind::RgAny,
            NodeRef::RgQM(_) => NodeKind::RgQM,
            NodeRef::RawString(_) => NodeKind::RawString,
            NodeRef::SimpleString(_) => NodeKind::SimpleString,
            NodeRef::AnyLetter(_) => NodeKind::AnyLetter,
        }
    }

    /// The CQL text of the node.
    pub fn text(&self) -> String {
        match self {
            NodeRef::Query(n) => n.to_string(),
            NodeRef::Sequence(n) => n.to_string(),
            NodeRef::Seq(n) => n.to_string(),
            NodeRef::Repetition(n) => n.to_string(),
            NodeRef::AtomQuery(n) => n.to_string(),
            NodeRef::Position(n) => n.to_string(),
            NodeRef::NumberedPosition(n) => n.to_string(),
            NodeRef::OnePosition(n) => n.to_string(),
            NodeRef::MuPart(n) => n.to_string(),
            NodeRef::UnionOp(n) => n.to_string(),
            NodeRef::MeetOp(n) => n.to_string(),
            NodeRef::RepOpt(n) => n.to_string(),
            NodeRef::OpenStructTag(n) => n.to_string(),
            NodeRef::CloseStructTag(n) => n.to_string(),
            NodeRef::Structure(n) => n.to_string(),
            NodeRef::AttValList(n) => n.to_string(),
            NodeRef::AttValAnd(n) => n.to_string(),
            NodeRef::AttVal(n) => n.to_string(),
            NodeRef::WithinOrContaining(n) => n.to_string(),
            NodeRef::WithinContainingPart(n) => n.to_string(),
            NodeRef::WithinNumber(n) => n.to_string(),
            NodeRef::AlignedPart(n) => n.to_string(),
            NodeRef::GlobPart(n) => n.to_string(),
            NodeRef::GlobCond(n) => n.to_string(),
            NodeRef::RegExp(n) => n.to_string(),
            NodeRef::RegExpRaw(n) => n.to_string(),
            NodeRef::RgGrouped(n) => n.to_string(),
            NodeRef::RgSimple(n) => n.to_string(),
            NodeRef::RgLook(n) => n.to_string(),
            NodeRef::RgAlt(n) => n.to_string(),
            NodeRef::RgAltVal(n) => n.to_string(),
            NodeRef::RgChar(n) => n.to_string(),
            NodeRef::RgRange(n) => n.to_string(),
            NodeRef::RgRangeSpec(n) => n.to_string(),
            NodeRef::RgPosixClass(n) => n.to_string(),
            NodeRef::RgOp(n) => n.to_string(),
            NodeRef::RgRepeat(n) => n.to_string(),
            NodeRef::RgAny(n) => n.to_string(),
            NodeRef::RgQM(n) => n.to_string(),
            NodeRef::RawString(n) => n.to_string(),
            NodeRef::SimpleString(n) => n.to_string(),
            NodeRef::AnyLetter(c) => c.to_string(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Direct children in grammar order.
    pub fn children(&self) -> Children<'a> {
        match *self {
            NodeRef::Query(q) => {
                let mut children = Children::new();
                children.extend(q.sequence.as_ref().map(NodeRef::Sequence));
                children.extend(q.glob_part.as_ref().map(NodeRef::GlobPart));
                children.extend(q.within_or_containing.iter().map(NodeRef::WithinOrContaining));
                children
            }
            NodeRef::Sequence(s) => s.seqs.iter().map(NodeRef::Seq).collect(),
            NodeRef::Seq(s) => s.repetitions.iter().map(NodeRef::Repetition).collect(),
            NodeRef::Repetition(r) => match r {
                Repetition::Atom { atom, rep_opt } => {
                    let mut children: Children = smallvec![NodeRef::AtomQuery(atom)];
                    children.extend(rep_opt.as_ref().map(NodeRef::RepOpt));
                    children
                }
                Repetition::OpenStructTag(tag) => smallvec![NodeRef::OpenStructTag(tag)],
                Repetition::CloseStructTag(tag) => smallvec![NodeRef::CloseStructTag(tag)],
            },
            NodeRef::AtomQuery(a) => match a {
                AtomQuery::Position(position) => smallvec![NodeRef::Position(position)],
                AtomQuery::Group { sequence, blocks } => {
                    let mut children: Children = smallvec![NodeRef::Sequence(sequence)];
                    children.extend(blocks.iter().map(NodeRef::WithinOrContaining));
                    children
                }
            },
            NodeRef::Position(p) => match p {
                Position::One(position) => smallvec![NodeRef::OnePosition(position)],
                Position::Numbered(position) => smallvec![NodeRef::NumberedPosition(position)],
            },
            NodeRef::NumberedPosition(p) => smallvec![NodeRef::OnePosition(&p.position)],
            NodeRef::OnePosition(p) => match p {
                OnePosition::AttValList(Some(list)) => smallvec![NodeRef::AttValList(list)],
                OnePosition::AttValList(None) | OnePosition::MuKeyword => Children::new(),
                OnePosition::Regex(regex) | OnePosition::Anchored { regex, .. } => {
                    smallvec![NodeRef::RegExp(regex)]
                }
                OnePosition::Mu(mu) => smallvec![NodeRef::MuPart(mu)],
            },
            NodeRef::MuPart(m) => match m {
                MuPart::Union(op) => smallvec![NodeRef::UnionOp(op)],
                MuPart::Meet(op) => smallvec![NodeRef::MeetOp(op)],
            },
            NodeRef::UnionOp(op) => {
                smallvec![NodeRef::Position(&op.left), NodeRef::Position(&op.right)]
            }
            NodeRef::MeetOp(op) => {
                smallvec![NodeRef::Position(&op.left), NodeRef::Position(&op.right)]
            }
            NodeRef::OpenStructTag(tag) => smallvec![NodeRef::Structure(&tag.structure)],
            NodeRef::CloseStructTag(tag) => smallvec![NodeRef::Structure(&tag.structure)],
            NodeRef::Structure(s) => s.att_val_list.iter().map(NodeRef::AttValList).collect(),
            NodeRef::AttValList(list) => list.items.iter().map(NodeRef::AttValAnd).collect(),
            NodeRef::AttValAnd(and) => and.items.iter().map(NodeRef::AttVal).collect(),
            NodeRef::AttVal(v) => match v {
                AttVal::Raw { value, .. } => smallvec![NodeRef::RawString(value)],
                AttVal::Regex { regex, .. } => smallvec![NodeRef::RegExp(regex)],
                AttVal::PosNumRange { .. } | AttVal::PosNum(_) => Children::new(),
                AttVal::Not(inner) => smallvec![NodeRef::AttVal(inner)],
                AttVal::Group(list)
                | AttVal::Swap { list, .. }
                | AttVal::Ccoll { list, .. } => smallvec![NodeRef::AttValList(list)],
                AttVal::WsTerm { args, .. } => match args {
                    WsTermArgs::Numbers(..) => Children::new(),
                    WsTermArgs::Regexes(a, b, c) => smallvec![
                        NodeRef::RegExp(a),
                        NodeRef::RegExp(b),
                        NodeRef::RegExp(c)
                    ],
                },
            },
            NodeRef::WithinOrContaining(w) => smallvec![NodeRef::WithinContainingPart(&w.part)],
            NodeRef::WithinContainingPart(part) => match part {
                WithinContainingPart::Sequence(sequence) => smallvec![NodeRef::Sequence(sequence)],
                WithinContainingPart::Number(number) => smallvec![NodeRef::WithinNumber(number)],
                WithinContainingPart::Aligned { part, .. } => smallvec![NodeRef::AlignedPart(part)],
            },
            NodeRef::AlignedPart(part) => smallvec![NodeRef::Sequence(&part.sequence)],
            NodeRef::GlobPart(glob) => glob.conds.iter().map(NodeRef::GlobCond).collect(),
            NodeRef::RegExp(regex) => regex.alternatives.iter().map(NodeRef::RegExpRaw).collect(),
            NodeRef::RegExpRaw(raw) => raw
                .items
                .iter()
                .map(|item| match item {
                    RegExpItem::Look(look) => NodeRef::RgLook(look),
                    RegExpItem::Grouped(grouped) => NodeRef::RgGrouped(grouped),
                    RegExpItem::Simple(simple) => NodeRef::RgSimple(simple),
                })
                .collect(),
            NodeRef::RgGrouped(grouped) => {
                grouped.alternatives.iter().map(NodeRef::RegExpRaw).collect()
            }
            NodeRef::RgSimple(simple) => simple
                .items
                .iter()
                .map(|item| match item {
                    RgSimpleItem::Range(range) => NodeRef::RgRange(range),
                    RgSimpleItem::Char(ch) => NodeRef::RgChar(ch),
                    RgSimpleItem::Alt(alt) => NodeRef::RgAlt(alt),
                    RgSimpleItem::PosixClass(class) => NodeRef::RgPosixClass(class),
                })
                .collect(),
            NodeRef::RgAlt(alt) => alt.values.iter().map(NodeRef::RgAltVal).collect(),
            NodeRef::RgAltVal(v) => match v {
                RgAltVal::Char(ch) => smallvec![NodeRef::RgChar(ch)],
                RgAltVal::Escaped(_) | RgAltVal::Range { .. } => Children::new(),
            },
            NodeRef::RgChar(ch) => match ch {
                RgChar::Literal { .. } => Children::new(),
                RgChar::Op(op) => smallvec![NodeRef::RgOp(op)],
                RgChar::Repeat(repeat) => smallvec![NodeRef::RgRepeat(repeat)],
                RgChar::Any(any) => smallvec![NodeRef::RgAny(any)],
                RgChar::QuestionMark(qm) => smallvec![NodeRef::RgQM(qm)],
            },
            NodeRef::RgRange(range) => smallvec![NodeRef::RgRangeSpec(&range.spec)],
            NodeRef::RawString(raw) => smallvec![NodeRef::SimpleString(&raw.value)],
            NodeRef::SimpleString(s) => s.value.chars().map(NodeRef::AnyLetter).collect(),
            NodeRef::RepOpt(_)
            | NodeRef::WithinNumber(_)
            | NodeRef::GlobCond(_)
            | NodeRef::RgLook(_)
            | NodeRef::RgRangeSpec(_)
            | NodeRef::RgPosixClass(_)
            | NodeRef::RgOp(_)
            | NodeRef::RgRepeat(_)
            | NodeRef::RgAny(_)
            | NodeRef::RgQM(_)
            | NodeRef::AnyLetter(_) => Children::new(),
        }
    }
}

/// Callbacks for [`walk`]. `enter` runs before the children, `leave` after.
pub trait Visitor<'a> {
    fn enter(&mut self, _parent: Option<NodeRef<'a>>, _node: NodeRef<'a>) {}

    fn leave(&mut self, _parent: Option<NodeRef<'a>>, _node: NodeRef<'a>) {}
}

/// One step of the ancestor chain handed to a [`PathVisitor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEntry<'a> {
    pub id: NodeId,
    pub node: NodeRef<'a>,
}

pub trait PathVisitor<'a> {
    /// Called after all children of the last entry of `path` were visited.
    /// `path[0]` is the root.
    fn post(&mut self, path: &[PathEntry<'a>]);
}

impl<'a, F> PathVisitor<'a> for F
where
    F: FnMut(&[PathEntry<'a>]),
{
    fn post(&mut self, path: &[PathEntry<'a>]) {
        self(path)
    }
}

/// Pre-order walk over the whole query.
pub fn walk<'a, V: Visitor<'a>>(query: &'a Query, visitor: &mut V) {
    walk_node(None, NodeRef::Query(query), visitor);
}

fn walk_node<'a, V: Visitor<'a>>(parent: Option<NodeRef<'a>>, node: NodeRef<'a>, visitor: &mut V) {
    visitor.enter(parent, node);
    for child in node.children() {
        walk_node(Some(node), child, visitor);
    }
    visitor.leave(parent, node);
}

/// Depth-first walk reporting every node after its children, together with
/// the chain of its ancestors. Node ids are assigned in pre-order, so they
/// match the order in which [`walk`] enters nodes.
pub fn walk_with_path<'a, V: PathVisitor<'a>>(query: &'a Query, visitor: &mut V) {
    let mut path = Vec::with_capacity(32);
    let mut next_id = 0;
    walk_path_node(NodeRef::Query(query), &mut path, &mut next_id, visitor);
}

fn walk_path_node<'a, V: PathVisitor<'a>>(
    node: NodeRef<'a>,
    path: &mut Vec<PathEntry<'a>>,
    next_id: &mut NodeId,
    visitor: &mut V,
) {
    path.push(PathEntry { id: *next_id, node });
    *next_id += 1;
    for child in node.children() {
        walk_path_node(child, path, next_id, visitor);
    }
    visitor.post(path);
    path.pop();
}

struct ForEach<F>(F);

impl<'a, F> Visitor<'a> for ForEach<F>
where
    F: FnMut(Option<NodeRef<'a>>, NodeRef<'a>),
{
    fn enter(&mut self, parent: Option<NodeRef<'a>>, node: NodeRef<'a>) {
        (self.0)(parent, node)
    }
}

/// Calls `f` with every `(parent, node)` pair in pre-order.
pub fn for_each<'a, F>(query: &'a Query, f: F)
where
    F: FnMut(Option<NodeRef<'a>>, NodeRef<'a>),
{
    walk(query, &mut ForEach(f));
}

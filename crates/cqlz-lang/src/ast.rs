pub mod debug;
pub mod effect;
pub mod kind;
pub mod node;
pub mod visit;

pub use debug::dump_tree;
pub use effect::EffectTable;
pub use kind::NodeKind;
pub use visit::{NodeId, NodeRef, PathEntry, PathVisitor, Visitor, for_each, walk, walk_with_path};

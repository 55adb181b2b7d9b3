//! Compiler from syntax trees to cost programs.
//!
//! The tree is walked once in pre-order. Every node either pushes a weight
//! constant on entry or folds the values its children left on the stack once
//! they are done, following the table in [`weights`]. The resulting
//! [`Program`](crate::vm::Program) leaves exactly one value, the slowness
//! estimate of the query.
//!
//! ## Wildcards
//!
//! Consecutive `.` inside one `RgSimple` are not scored one by one. A run of
//! `n` wildcards is emitted as a single constant
//! `w[RgAny] * WILDCARD_RUN_PROB[n - 1]`, see [`wildcard`].
//!
//! ## Example
//!
//! ```rust
//! use cqlz_lang::{Weights, compile, parse, vm::Vm};
//!
//! let query = parse(r#"[word="a"]"#).unwrap();
//! let program = compile(&query, &Weights::default()).unwrap();
//!
//! assert_eq!(Vm::new().run(&program).unwrap(), 1.0);
//! ```

mod compile;
pub mod error;
#[cfg(test)]
mod test_compiler;
pub mod weights;
pub mod wildcard;

use crate::ast::node::Query;
use crate::vm::Program;

pub use compile::Compiler;
pub use error::CompileError;
pub use weights::{WeightSlot, Weights};

pub fn compile(query: &Query, weights: &Weights) -> Result<Program, CompileError> {
    Compiler::new(weights).compile(query)
}

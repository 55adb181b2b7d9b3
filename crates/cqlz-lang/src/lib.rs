//! `cqlz-lang` estimates how slow a CQL corpus query will be.
//!
//! A query is parsed into a syntax tree, compiled into a short program for a
//! stack machine and evaluated into a single score. The constants of the
//! program come from a [`Weights`] vector which can be fitted to measured
//! query times with the genetic [`Optimizer`].
//!
//! ## Examples
//!
//! ```rust
//! use cqlz_lang::{WeightSlot, Weights};
//!
//! let weights = Weights::default().with(WeightSlot::RgAny, 100.0);
//!
//! let slow = cqlz_lang::score_text(r#"[word=".*"]"#, &weights).unwrap();
//! let fast = cqlz_lang::score_text(r#"[tag="N"]"#, &weights).unwrap();
//!
//! assert!(slow > fast);
//!
//! // Inspect the syntax tree and the program
//! let query = cqlz_lang::parse(r#"[lemma="house"] within <s/>"#).unwrap();
//! let program = cqlz_lang::compile(&query, &weights).unwrap();
//!
//! assert!(!program.is_empty());
//! ```
pub mod ast;
pub mod compiler;
mod error;
pub mod optimizer;
pub mod parser;
pub mod vm;

pub use ast::node::Query;
pub use ast::{EffectTable, NodeKind, NodeRef, Visitor, dump_tree, walk};
pub use compiler::{CompileError, WeightSlot, Weights, compile};
pub use error::{Error, InnerError};
pub use optimizer::{
    CancelToken, Dataset, EvalStats, Optimizer, OptimizerConfig, OptimizerResult,
};
pub use vm::{Program, Vm};

pub type CqlzResult<T> = Result<T, Error>;

#[allow(clippy::result_large_err)]
pub fn parse(text: &str) -> CqlzResult<Query> {
    parser::parse(text).map_err(|e| Error::from_error(text, InnerError::Parse(e)))
}

/// Compiles `query` and runs the program.
#[allow(clippy::result_large_err)]
pub fn score(query: &Query, weights: &Weights) -> CqlzResult<f64> {
    let source = || query.to_string();
    let program =
        compile(query, weights).map_err(|e| Error::from_error(source(), InnerError::Compile(e)))?;

    Vm::new()
        .run(&program)
        .map_err(|e| Error::from_error(source(), InnerError::Vm(e)))
}

#[allow(clippy::result_large_err)]
pub fn score_text(text: &str, weights: &Weights) -> CqlzResult<f64> {
    let query = parse(text)?;
    score(&query, weights).map_err(|e| Error::from_error(text, e.cause))
}

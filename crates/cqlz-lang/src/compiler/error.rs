use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Query produces no cost terms")]
    EmptyQuery,
    #[error("Expected {expected} weights, found {found}")]
    InvalidDimension { expected: usize, found: usize },
}

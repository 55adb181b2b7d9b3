use miette::{Diagnostic, SourceSpan};

use crate::{
    compiler::CompileError,
    optimizer::{ConfigError, OptimizerError},
    parser::error::ParseError,
    vm::VmError,
};

#[derive(Debug, thiserror::Error)]
pub enum InnerError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Represents a high-level error with diagnostic information for the user.
#[derive(Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// The query the error refers to, empty when there is none.
    pub source_code: String,
    /// The location in the query for diagnostics.
    pub location: SourceSpan,
}

impl Error {
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();
        let location = match &cause {
            InnerError::Parse(
                err @ (ParseError::UnexpectedToken { .. } | ParseError::TooDeep { .. }),
            ) => {
                let start = err.offset().min(source_code.len());
                let end = (start + err.span_len()).min(source_code.len());
                SourceSpan::from(start..end)
            }
            InnerError::Parse(ParseError::UnexpectedEOFDetected { .. }) => {
                SourceSpan::from(source_code.len()..source_code.len())
            }
            _ => SourceSpan::from(0..source_code.len()),
        };

        Self {
            cause,
            source_code,
            location,
        }
    }

    /// An error not tied to any query text.
    pub fn without_source(cause: impl Into<InnerError>) -> Self {
        Self::from_error(String::new(), cause.into())
    }
}

macro_rules! impl_from_cause {
    ($($cause:ty),+) => {
        $(
            impl From<$cause> for Error {
                fn from(cause: $cause) -> Self {
                    Self::without_source(cause)
                }
            }
        )+
    };
}

impl_from_cause!(CompileError, VmError, OptimizerError, ConfigError);

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match &self.cause {
            InnerError::Parse(ParseError::UnexpectedToken { .. }) => "ParseError::UnexpectedToken",
            InnerError::Parse(ParseError::UnexpectedEOFDetected { .. }) => {
                "ParseError::UnexpectedEOFDetected"
            }
            InnerError::Parse(ParseError::TooDeep { .. }) => "ParseError::TooDeep",
            InnerError::Compile(CompileError::EmptyQuery) => "CompileError::EmptyQuery",
            InnerError::Compile(CompileError::InvalidDimension { .. }) => {
                "CompileError::InvalidDimension"
            }
            InnerError::Vm(VmError::StackUnderflow { .. }) => "VmError::StackUnderflow",
            InnerError::Vm(VmError::EmptyStack) => "VmError::EmptyStack",
            InnerError::Optimizer(OptimizerError::Cancelled) => "OptimizerError::Cancelled",
            InnerError::Optimizer(OptimizerError::EmptyDataset) => "OptimizerError::EmptyDataset",
            InnerError::Optimizer(OptimizerError::InvalidConfig(_)) => {
                "OptimizerError::InvalidConfig"
            }
            InnerError::Optimizer(OptimizerError::ThreadPool(_)) => "OptimizerError::ThreadPool",
            InnerError::Optimizer(OptimizerError::Weights(_)) => "OptimizerError::Weights",
            InnerError::Config(ConfigError::Io { .. }) => "ConfigError::Io",
            InnerError::Config(ConfigError::Toml(_)) => "ConfigError::Toml",
            InnerError::Config(ConfigError::Json(_)) => "ConfigError::Json",
            InnerError::Config(ConfigError::Csv(_)) => "ConfigError::Csv",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match &self.cause {
            InnerError::Parse(ParseError::UnexpectedToken { .. }) => {
                Some("Check for unbalanced brackets, quotes or misplaced operators.".to_string())
            }
            InnerError::Parse(ParseError::UnexpectedEOFDetected { .. }) => {
                Some("Query ended unexpectedly. Check for a missing `]`, `\"` or `>`.".to_string())
            }
            InnerError::Parse(ParseError::TooDeep { .. }) => {
                Some("Flatten nested groups, negations or regex groups.".to_string())
            }
            InnerError::Compile(CompileError::EmptyQuery) => {
                Some("The query has no scorable part, e.g. only empty regular expressions.".to_string())
            }
            InnerError::Compile(CompileError::InvalidDimension { expected, .. }) => Some(format!(
                "A weights file must contain exactly {expected} numbers."
            )),
            InnerError::Vm(_) => {
                Some("An internal error occurred. Please report this if it persists.".to_string())
            }
            InnerError::Optimizer(OptimizerError::EmptyDataset) => Some(
                "Every record of the dataset was skipped. Run with `-v` to see why.".to_string(),
            ),
            InnerError::Optimizer(OptimizerError::InvalidConfig(_)) => {
                Some("Check the optimizer configuration file and flags.".to_string())
            }
            InnerError::Config(ConfigError::Io { .. }) => {
                Some("Check the file path and permissions.".to_string())
            }
            _ => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        if self.source_code.is_empty() {
            return None;
        }

        Some(Box::new(std::iter::once(
            miette::LabeledSpan::new_with_span(Some(format!("{}", self.cause)), self.location),
        )))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        if self.source_code.is_empty() {
            None
        } else {
            Some(&self.source_code)
        }
    }
}

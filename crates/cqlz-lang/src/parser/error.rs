use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected input `{found}`")]
    UnexpectedToken { offset: usize, found: String },
    #[error("Unexpected end of query")]
    UnexpectedEOFDetected { offset: usize },
    #[error("Query nests deeper than {} levels", super::MAX_DEPTH)]
    TooDeep { offset: usize },
}

impl ParseError {
    /// Byte offset of the first input that could not be parsed.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::UnexpectedEOFDetected { offset }
            | ParseError::TooDeep { offset } => *offset,
        }
    }

    /// Length of the offending input, at least one byte.
    pub fn span_len(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { found, .. } => found.len().max(1),
            ParseError::UnexpectedEOFDetected { .. } | ParseError::TooDeep { .. } => 1,
        }
    }
}

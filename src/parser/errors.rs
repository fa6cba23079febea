use thiserror::Error;

use crate::models::{RowError, RowErrorKind};
use crate::types::LineNumber;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line [{line_number}] could not be parsed: {reason}")]
pub struct ParseError {
    pub line_number: LineNumber,
    pub reason: ParseErrorReason
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorReason {
    #[error("expected [{expected}] columns but found [{found}]")]
    ColumnCount {
        expected: usize,
        found: usize
    },
    #[error("quoting is unbalanced")]
    UnbalancedQuotes,
    #[error("header has no columns")]
    EmptyHeader,
    #[error("{0}")]
    Malformed(String)
}

impl ParseError {
    pub fn new(line_number: LineNumber, reason: ParseErrorReason) -> Self {
        Self { line_number, reason }
    }
}

impl From<&ParseError> for RowError {
    fn from(error: &ParseError) -> Self {
        Self {
            line_number: error.line_number,
            kind: RowErrorKind::Parse,
            reason: error.reason.to_string()
        }
    }
}

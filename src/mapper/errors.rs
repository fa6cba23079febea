use thiserror::Error;

use crate::models::{RowError, RowErrorKind};
use crate::types::LineNumber;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Line [{line_number}] has no value for identifier column [{field}]")]
    MissingIdentifier {
        line_number: LineNumber,
        field: String
    }
}

impl MappingError {
    pub fn missing_identifier(line_number: LineNumber, field: &str) -> Self {
        Self::MissingIdentifier {
            line_number,
            field: field.to_string()
        }
    }

    pub fn line_number(&self) -> LineNumber {
        match self {
            Self::MissingIdentifier { line_number, .. } => *line_number
        }
    }
}

impl From<&MappingError> for RowError {
    fn from(error: &MappingError) -> Self {
        match error {
            MappingError::MissingIdentifier { line_number, field } => Self {
                line_number: *line_number,
                kind: RowErrorKind::MissingIdentifier,
                reason: format!("identifier column [{field}] is empty")
            }
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("No schema is registered for processor [{processor}]")]
    UnknownProcessor {
        processor: String
    },
    #[error("Invalid schema for processor [{processor}]: {reason}")]
    InvalidSchema {
        processor: String,
        reason: String
    },
    #[error("Schema configuration could not be read: {0}")]
    Config(#[from] csv::Error)
}

impl SchemaError {
    pub fn unknown_processor(processor: &str) -> Self {
        Self::UnknownProcessor { processor: processor.to_string() }
    }

    pub fn invalid_schema(processor: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            processor: processor.to_string(),
            reason: reason.into()
        }
    }
}

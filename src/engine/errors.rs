use thiserror::Error;
use tokio::task::JoinError;

use crate::audit::AuditWriteError;
use crate::schema::SchemaError;

/// Batch-level failures. Anything row-level ends up in the `BatchResult` instead.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("No registered processor schema matches the statement header {columns:?}")]
    SchemaNotDetected {
        columns: Vec<String>
    },
    #[error(transparent)]
    AuditWrite(#[from] AuditWriteError),
    #[error("Ingestion worker failed: {0}")]
    Worker(#[from] JoinError)
}

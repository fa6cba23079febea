use thiserror::Error;

use crate::models::{AuditAction, AuditEntry};
use crate::types::LineNumber;

#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("Audit sink is unavailable: {0}")]
    Unavailable(String),
    #[error("Audit sink write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Audit sink write failed: {0}")]
    Io(#[from] std::io::Error)
}

/// An audit entry could not be persisted. Fatal to the batch that produced it.
#[derive(Debug, Error)]
#[error("Audit entry [{action}] for processor [{processor_name}] line [{source_line:?}] was not written: {source}")]
pub struct AuditWriteError {
    pub action: AuditAction,
    pub processor_name: String,
    pub source_line: Option<LineNumber>,
    #[source]
    pub source: AuditSinkError
}

impl AuditWriteError {
    pub fn new(entry: &AuditEntry, source: AuditSinkError) -> Self {
        Self {
            action: entry.action,
            processor_name: entry.processor_name.clone(),
            source_line: entry.source_line,
            source
        }
    }
}

mod audit_entry;
mod batch;
mod issue;
mod record;

pub use audit_entry::{AuditAction, AuditEntry};
pub use batch::{BatchResult, RejectedRecord, RowError, RowErrorKind};
pub use issue::{IssueKind, Severity, ValidationIssue};
pub use record::{CandidateRecord, ValidatedRecord};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{CandidateRecord, Severity, ValidationIssue};
use crate::types::LineNumber;

/// A candidate that carried at least one Error-severity issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub record: CandidateRecord,
    pub issues: Vec<ValidationIssue>
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum RowErrorKind {
    Parse,
    MissingIdentifier
}

/// A statement line that never became a candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub line_number: LineNumber,
    pub kind: RowErrorKind,
    pub reason: String
}

/// Outcome of one statement ingestion.
///
/// Totals cover `valid_records` only. `issues` holds every issue raised in the batch,
/// including warnings on records that were accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub processor_name: String,
    /// Non-blank data lines seen, header excluded.
    pub total_rows: usize,
    pub valid_records: Vec<CandidateRecord>,
    pub rejected_records: Vec<RejectedRecord>,
    pub total_revenue: Decimal,
    pub total_volume: Decimal,
    pub total_transactions: u64,
    pub issues: Vec<ValidationIssue>,
    pub row_errors: Vec<RowError>
}

impl BatchResult {
    pub fn empty(processor_name: &str) -> Self {
        Self {
            processor_name: processor_name.to_string(),
            total_rows: 0,
            valid_records: Vec::new(),
            rejected_records: Vec::new(),
            total_revenue: Decimal::ZERO,
            total_volume: Decimal::ZERO,
            total_transactions: 0,
            issues: Vec::new(),
            row_errors: Vec::new()
        }
    }

    pub fn count_issues(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|issue| issue.severity == severity).count()
    }

    /// True when every row was read, mapped, and accepted without a single issue.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.row_errors.is_empty() && self.rejected_records.is_empty()
    }
}

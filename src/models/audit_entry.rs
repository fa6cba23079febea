use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::types::{Confidence, LineNumber};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditAction {
    FieldMapped,
    FieldDefaulted,
    UnitConverted,
    RecordMapped,
    RowSkipped,
    Validated,
    Rejected,
    Flagged
}

impl Display for AuditAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::FieldMapped => "field-mapped",
            AuditAction::FieldDefaulted => "field-defaulted",
            AuditAction::UnitConverted => "unit-converted",
            AuditAction::RecordMapped => "record-mapped",
            AuditAction::RowSkipped => "row-skipped",
            AuditAction::Validated => "validated",
            AuditAction::Rejected => "rejected",
            AuditAction::Flagged => "flagged"
        };

        formatter.write_str(name)
    }
}

/// One transformation or validation decision. Entries are written once and never changed.
///
/// `timestamp` is assigned by the recorder when the entry is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub processor_name: String,
    pub source_line: Option<LineNumber>,
    pub field: Option<String>,
    pub before_value: Option<String>,
    pub after_value: Option<String>,
    pub confidence: Confidence,
    pub confidence_delta: i16
}

impl AuditEntry {
    pub fn new(action: AuditAction, processor_name: &str, source_line: Option<LineNumber>) -> Self {
        Self {
            timestamp: DateTime::<Utc>::MIN_UTC,
            action,
            processor_name: processor_name.to_string(),
            source_line,
            field: None,
            before_value: None,
            after_value: None,
            confidence: Confidence::MAX,
            confidence_delta: 0
        }
    }

    pub fn field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn before(mut self, value: impl Into<String>) -> Self {
        self.before_value = Some(value.into());
        self
    }

    pub fn after(mut self, value: impl Into<String>) -> Self {
        self.after_value = Some(value.into());
        self
    }

    pub fn confidence(mut self, confidence: Confidence, delta: i16) -> Self {
        self.confidence = confidence;
        self.confidence_delta = delta;
        self
    }
}

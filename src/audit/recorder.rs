use crate::audit::{AuditSink, AuditWriteError};
use crate::models::AuditEntry;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Stamps audit entries and hands them to the sink.
///
/// Timestamps are strictly increasing per recorder, even when the clock has not moved
/// between two entries. A sink failure is never swallowed.
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    last_timestamp: Mutex<DateTime<Utc>>
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            last_timestamp: Mutex::new(DateTime::<Utc>::MIN_UTC)
        }
    }

    /// Appends one entry.
    ///
    /// # Errors
    /// Returns `AuditWriteError` when the sink refuses the entry.
    pub fn record(&self, mut entry: AuditEntry) -> Result<(), AuditWriteError> {
        entry.timestamp = self.next_timestamp();

        self.sink.append(&entry)
            .map_err(|source| AuditWriteError::new(&entry, source))
    }

    /// Appends entries in order, stopping at the first failure.
    pub fn record_all(&self, entries: impl IntoIterator<Item = AuditEntry>) -> Result<usize, AuditWriteError> {
        let mut written = 0;

        for entry in entries {
            self.record(entry)?;
            written += 1;
        }

        Ok(written)
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_timestamp.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();

        let stamp = if now > *last { now } else { *last + Duration::microseconds(1) };
        *last = stamp;

        stamp
    }
}

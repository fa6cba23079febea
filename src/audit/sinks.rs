use crate::audit::AuditSinkError;
use crate::models::AuditEntry;
use csv::{Writer, WriterBuilder};
use dashmap::DashMap;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Append-only destination for audit entries, owned by the storage layer.
pub trait AuditSink: Send + Sync + 'static {
    fn append(&self, entry: &AuditEntry) -> Result<(), AuditSinkError>;
}

/// Keeps entries in memory in append order. Safe to share between writers.
pub struct InMemoryAuditSink {
    entries: DashMap<u64, AuditEntry>,
    sequence: AtomicU64
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            sequence: AtomicU64::new(0)
        }
    }

    /// A snapshot of every entry written so far, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        let mut entries: Vec<(u64, AuditEntry)> = self.entries.iter()
            .map(|item| (*item.key(), item.value().clone()))
            .collect();

        entries.sort_by_key(|(sequence, _)| *sequence);
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(sequence, entry.clone());

        Ok(())
    }
}

/// Appends entries to a CSV file, flushing after every entry.
pub struct CsvAuditSink {
    writer: Mutex<Writer<File>>
}

impl CsvAuditSink {
    /// Opens `path` for appending, creating it if needed. The header row is only written
    /// when the file starts out empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditSinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;

        let is_empty = file.metadata()?.len() == 0;

        let writer = WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);

        Ok(Self {
            writer: Mutex::new(writer)
        })
    }
}

impl AuditSink for CsvAuditSink {
    fn append(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        let mut writer = self.writer.lock()
            .map_err(|_| AuditSinkError::Unavailable("audit writer lock is poisoned".to_string()))?;

        writer.serialize(entry)?;
        writer.flush()?;

        Ok(())
    }
}

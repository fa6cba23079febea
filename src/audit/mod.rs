mod errors;
mod recorder;
mod sinks;

pub use errors::{AuditSinkError, AuditWriteError};
pub use recorder::AuditRecorder;
pub use sinks::{AuditSink, CsvAuditSink, InMemoryAuditSink};

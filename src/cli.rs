use clap::Parser;
use std::path::PathBuf;

/// Ingest one processor residual statement and print the accepted records as CSV.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "residual-ingest",
    version,
    about = "Map, validate, and audit a processor residual statement",
    long_about = "Reads one month's residual statement, maps it through the processor's schema, \
                  checks every record for financial integrity, and appends each decision to the \
                  audit trail. Accepted records are written to stdout as CSV; issues go to stderr."
)]
pub struct Args {
    /// Statement CSV exported from the processor portal
    #[arg(value_name = "STATEMENT")]
    pub statement: PathBuf,

    /// Processor whose schema to apply; detected from the header when omitted
    #[arg(short = 'p', long = "processor", value_name = "NAME")]
    pub processor: Option<String>,

    /// Last month's accepted records, used for the month-over-month variance check
    #[arg(long = "prior", value_name = "PATH")]
    pub prior: Option<PathBuf>,

    /// Extra processor schemas to register on top of the built-in ones
    #[arg(long = "schemas", value_name = "PATH")]
    pub schemas: Option<PathBuf>,

    /// Audit trail file; entries are appended
    #[arg(long = "audit", value_name = "PATH", default_value = "audit.csv")]
    pub audit: PathBuf,

    /// Parallel parse and map workers
    #[arg(short = 'w', long = "workers", value_name = "N", default_value_t = 4)]
    pub workers: usize,

    /// One of error, warn, info, debug, trace
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "error")]
    pub log_level: String
}

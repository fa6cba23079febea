mod errors;
mod ingest_engine;

pub use errors::IngestionError;
pub use ingest_engine::IngestEngine;

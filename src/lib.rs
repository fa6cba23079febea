//! Residual statement ingestion.
//!
//! Each processor's monthly statement is parsed line by line, mapped onto a common record
//! through that processor's [`schema::ProcessorSchema`], checked by the [`validator`] rules,
//! and every decision along the way is appended to an [`audit`] sink.

pub mod audit;
pub mod engine;
pub mod mapper;
pub mod models;
pub mod parser;
pub mod schema;
pub mod types;
pub mod validator;

mod builtin;
mod errors;
mod processor_schema;
mod registry;

pub use errors::SchemaError;
pub use processor_schema::{ProcessorSchema, RevenueRange, RevenueUnit};
pub use registry::SchemaRegistry;

mod errors;
mod field_mapper;
#[cfg(test)]
mod tests;

pub use errors::MappingError;
pub use field_mapper::{FieldMapper, MappedRow};

mod batch_validator;
mod rules;

pub use batch_validator::{Candidate, Validator};
pub use rules::ValidationRules;

mod confidence;
mod errors;
mod monetary;

pub use confidence::Confidence;
pub use errors::AmountError;
pub use monetary::{deserialize_amount, is_blank, parse_amount, parse_count, round_amount, strip_quotes};

pub type LineNumber = usize;
pub type MerchantId = String;

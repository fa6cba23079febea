use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount error: Value is an empty string")]
    Empty,
    #[error("Amount error: {0}")]
    InvalidFormat(String),
    #[error("Amount error: Count [{0}] is negative")]
    Negative(Decimal),
    #[error("Amount error: Count [{0}] is not a whole number")]
    Fractional(Decimal),
    #[error("Amount error: Overflow")]
    Overflow
}

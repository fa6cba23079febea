use crate::types::errors::AmountError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

const DECIMAL_PLACES: u32 = 4;
const CURRENCY_CODE: &str = "USD";

/// Parses a statement amount into a [`Decimal`], tolerating the formatting noise processors
/// put into their exports.
///
/// Accepted noise: surrounding whitespace and quotes, `$` signs, a leading or trailing `USD`
/// code, `,` thousands separators, accounting negatives such as `(12.50)`, trailing minus
/// signs such as `12.50-`, and scientific notation from spreadsheet exports.
///
/// # Errors
/// Returns `AmountError::Empty` for blank values and `AmountError::InvalidFormat` for anything
/// that is not a number once the noise is removed (percentages included).
pub fn parse_amount(value: &str) -> Result<Decimal, AmountError> {
    let value = strip_quotes(value);

    if value.is_empty() {
        return Err(AmountError::Empty);
    }

    if value.contains('%') {
        return Err(AmountError::InvalidFormat(format!("Value [{value}] is a percentage, not an amount")));
    }

    let unprefixed = value.strip_prefix('$').map_or(value, str::trim_start);

    let (unwrapped, parenthesized) = match unprefixed.strip_prefix('(').and_then(|inner| inner.strip_suffix(')')) {
        Some(inner) => (inner.trim(), true),
        None => (unprefixed, false)
    };

    let (unsigned, trailing_minus) = match unwrapped.strip_suffix('-') {
        Some(inner) if !inner.trim().is_empty() => (inner.trim_end(), true),
        _ => (unwrapped, false)
    };

    let cleaned: String = strip_currency_code(unsigned)
        .chars()
        .filter(|character| !matches!(character, '$' | ',' | ' ' | '\u{a0}'))
        .collect();

    if !cleaned.chars().any(|character| character.is_ascii_digit()) {
        return Err(AmountError::InvalidFormat(format!("Value [{value}] contains no digits")));
    }

    let parsed = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|error| AmountError::InvalidFormat(format!("Value [{value}] is not numeric: {error}")))?;

    if parenthesized || trailing_minus {
        Ok(-parsed.abs())
    } else {
        Ok(parsed)
    }
}

/// Parses a transaction count. Integral decimals such as `12.0` are accepted.
pub fn parse_count(value: &str) -> Result<u64, AmountError> {
    let amount = parse_amount(value)?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }

    if !amount.fract().is_zero() {
        return Err(AmountError::Fractional(amount));
    }

    amount.to_u64().ok_or(AmountError::Overflow)
}

/// Rounds a derived amount to the precision the pipeline stores.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Trims whitespace and one layer of surrounding quotes.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();

    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].trim();
        }
    }

    value
}

pub fn is_blank(value: &str) -> bool {
    strip_quotes(value).is_empty()
}

/// Serde adapter so configuration and prior-month files go through the same amount parsing
/// as statement rows.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_amount(&value).map_err(de::Error::custom)
}

fn strip_currency_code(value: &str) -> &str {
    let code_length = CURRENCY_CODE.len();

    if value.get(..code_length).is_some_and(|prefix| prefix.eq_ignore_ascii_case(CURRENCY_CODE)) {
        return value[code_length..].trim();
    }

    let suffix_start = value.len().saturating_sub(code_length);

    if value.len() > code_length && value.get(suffix_start..).is_some_and(|suffix| suffix.eq_ignore_ascii_case(CURRENCY_CODE)) {
        return value[..suffix_start].trim();
    }

    value
}

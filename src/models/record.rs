use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{deserialize_amount, Confidence, LineNumber, MerchantId};

/// A statement row after field mapping: typed, unit-normalized, and scored.
///
/// `merchant_id` and `merchant_name` are never empty; rows without them are rejected by the
/// mapper before a record is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub merchant_id: MerchantId,
    pub merchant_name: String,
    /// Net residual in currency units, after unit conversion.
    pub revenue: Decimal,
    /// Gross processing volume in currency units.
    pub volume: Decimal,
    pub transaction_count: u64,
    pub processor_name: String,
    /// 1-based line of the statement the record came from.
    pub source_line: LineNumber,
    pub mapping_confidence: Confidence
}

/// A record accepted in an earlier batch, as handed back by the persistence layer.
///
/// Deserializes from the CSV the command-line front end writes, so one month's output can be
/// fed in as the next month's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub merchant_id: MerchantId,
    #[serde(default)]
    pub merchant_name: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub revenue: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub volume: Decimal,
    #[serde(default)]
    pub transaction_count: u64,
    #[serde(default)]
    pub processor_name: String
}

impl From<CandidateRecord> for ValidatedRecord {
    fn from(record: CandidateRecord) -> Self {
        Self {
            merchant_id: record.merchant_id,
            merchant_name: record.merchant_name,
            revenue: record.revenue,
            volume: record.volume,
            transaction_count: record.transaction_count,
            processor_name: record.processor_name
        }
    }
}

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::models::CandidateRecord;
use crate::types::{Confidence, LineNumber, MerchantId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub enum IssueKind {
    MissingField,
    OutOfRange,
    DuplicateMerchantId,
    RevenueWithoutTransactions,
    HighRevenuePerTransaction,
    StatisticalOutlier,
    MonthOverMonthVariance
}

impl Display for IssueKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, formatter)
    }
}

/// Errors keep a record out of `valid_records`; warnings and info only inform review.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub merchant_id: MerchantId,
    pub source_line: Option<LineNumber>,
    pub message: String,
    pub suggested_action: String
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn out_of_range(record: &CandidateRecord, min: Decimal, max: Decimal) -> Self {
        Self::for_record(
            record,
            IssueKind::OutOfRange,
            Severity::Error,
            format!("Revenue [{}] is outside the expected range [{min}, {max}]", record.revenue),
            "verify field mapping — may be using volume instead of residual."
        )
    }

    pub fn revenue_without_transactions(record: &CandidateRecord) -> Self {
        Self::for_record(
            record,
            IssueKind::RevenueWithoutTransactions,
            Severity::Warning,
            format!("Revenue [{}] reported with zero transactions", record.revenue),
            "confirm the transaction count column is mapped, or that this is a fee-only adjustment."
        )
    }

    pub fn high_revenue_per_transaction(record: &CandidateRecord, per_transaction: Decimal, limit: Decimal) -> Self {
        Self::for_record(
            record,
            IssueKind::HighRevenuePerTransaction,
            Severity::Warning,
            format!(
                "Revenue per transaction [{}] exceeds [{limit}] ({} over {} transactions)",
                per_transaction.round_dp(2),
                record.revenue,
                record.transaction_count
            ),
            "check whether the revenue column holds gross volume rather than residual."
        )
    }

    pub fn duplicate_merchant_id(record: &CandidateRecord, first_line: LineNumber) -> Self {
        Self::for_record(
            record,
            IssueKind::DuplicateMerchantId,
            Severity::Error,
            format!("Merchant [{}] already appeared on line [{first_line}]", record.merchant_id),
            "merge or remove the duplicate statement rows before re-importing."
        )
    }

    pub fn statistical_outlier(record: &CandidateRecord, mean: Decimal, multiple: Decimal) -> Self {
        Self::for_record(
            record,
            IssueKind::StatisticalOutlier,
            Severity::Warning,
            format!(
                "Revenue [{}] exceeds {multiple}x the batch mean [{}]",
                record.revenue,
                mean.round_dp(2)
            ),
            "review manually; large merchants are legitimate but unusual."
        )
    }

    pub fn month_over_month_variance(record: &CandidateRecord, prior: Decimal, change: Decimal) -> Self {
        Self::for_record(
            record,
            IssueKind::MonthOverMonthVariance,
            Severity::Warning,
            format!(
                "Revenue moved from [{prior}] to [{}], a {}% change",
                record.revenue,
                change.saturating_mul(Decimal::ONE_HUNDRED).round_dp(1)
            ),
            "compare against the processor statement before approving."
        )
    }

    /// A record whose values cannot be added to the batch totals without overflowing.
    pub fn total_overflow(record: &CandidateRecord, field: &str) -> Self {
        Self::for_record(
            record,
            IssueKind::OutOfRange,
            Severity::Error,
            format!("Adding this record's {field} would overflow the batch total"),
            "verify field mapping — may be using volume instead of residual."
        )
    }

    /// A numeric field the mapper could not read and replaced with zero.
    pub fn coercion_fallback(record: &CandidateRecord, field: &str, detail: &str) -> Self {
        Self::for_record(
            record,
            IssueKind::MissingField,
            Severity::Warning,
            format!("Field [{field}] could not be read and was defaulted to 0: {detail}"),
            "check the processor schema against this statement's header."
        )
    }

    pub fn low_confidence(record: &CandidateRecord, kind: IssueKind, threshold: Confidence) -> Self {
        Self::for_record(
            record,
            kind,
            Severity::Warning,
            format!(
                "Mapping confidence [{}] is below the processor threshold [{threshold}]",
                record.mapping_confidence
            ),
            "verify field mapping before accepting this record."
        )
    }

    fn for_record(record: &CandidateRecord, kind: IssueKind, severity: Severity, message: String, suggested_action: &str) -> Self {
        Self {
            kind,
            severity,
            merchant_id: record.merchant_id.clone(),
            source_line: Some(record.source_line),
            message,
            suggested_action: suggested_action.to_string()
        }
    }
}

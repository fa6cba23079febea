use rust_decimal::Decimal;

/// Thresholds for the anomaly rules. Range limits come from the processor schema instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRules {
    /// Revenue per transaction above this is flagged, in currency units.
    pub max_revenue_per_transaction: Decimal,
    /// Revenue above this multiple of the batch mean is flagged.
    pub outlier_multiple: Decimal,
    /// Relative month-over-month change above this is flagged (5.0 = 500%).
    pub max_month_over_month_change: Decimal
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_revenue_per_transaction: Decimal::ONE_HUNDRED,
            outlier_multiple: Decimal::TEN,
            max_month_over_month_change: Decimal::from(5)
        }
    }
}

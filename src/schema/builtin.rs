use rust_decimal::Decimal;

use crate::schema::{ProcessorSchema, RevenueRange, RevenueUnit};
use crate::types::Confidence;

const DEFAULT_THRESHOLD: u8 = 70;

struct Layout {
    processor: &'static str,
    merchant_id: &'static str,
    merchant_name: &'static str,
    revenue: &'static str,
    volume: &'static str,
    transactions: &'static str,
    unit: RevenueUnit,
    min: i64,
    max: i64
}

//NOTE: Each layout was taken from a real statement header. The revenue column is always the agent
//      payout, never the gross processing column next to it.
const LAYOUTS: [Layout; 5] = [
    Layout {
        processor: "clearent",
        merchant_id: "MID",
        merchant_name: "Name",
        revenue: "Net",
        volume: "Sales",
        transactions: "Transactions",
        unit: RevenueUnit::Currency,
        min: 0,
        max: 10_000
    },
    Layout {
        processor: "tsys",
        merchant_id: "Merchant Number",
        merchant_name: "Merchant Name",
        revenue: "Agent Residual",
        volume: "Sales Volume",
        transactions: "Sales Count",
        unit: RevenueUnit::Currency,
        min: -500,
        max: 5_000
    },
    Layout {
        processor: "micamp",
        merchant_id: "Merchant ID",
        merchant_name: "DBA",
        revenue: "Residual",
        volume: "Volume",
        transactions: "Trans Count",
        unit: RevenueUnit::Currency,
        min: 0,
        max: 5_000
    },
    Layout {
        processor: "payment_advisors",
        merchant_id: "Merchant ID",
        merchant_name: "Merchant",
        revenue: "Residual BPS",
        volume: "Net Volume",
        transactions: "Txn Count",
        unit: RevenueUnit::BasisPoints,
        min: 0,
        max: 5_000
    },
    Layout {
        processor: "shift4",
        merchant_id: "Account",
        merchant_name: "Account Name",
        revenue: "Commission Cents",
        volume: "Gross Processing",
        transactions: "Items",
        unit: RevenueUnit::Cents,
        min: 0,
        max: 7_500
    }
];

/// Schemas for the processors the pipeline ships with.
pub(crate) fn builtin_schemas() -> Vec<ProcessorSchema> {
    LAYOUTS.iter().map(|layout| ProcessorSchema {
        processor_name: layout.processor.to_string(),
        revenue_field: layout.revenue.to_string(),
        volume_field: layout.volume.to_string(),
        transaction_count_field: layout.transactions.to_string(),
        merchant_id_field: layout.merchant_id.to_string(),
        merchant_name_field: layout.merchant_name.to_string(),
        revenue_unit: layout.unit,
        revenue_range: RevenueRange::new(Decimal::from(layout.min), Decimal::from(layout.max)),
        confidence_threshold: Confidence::new(DEFAULT_THRESHOLD).unwrap_or_default()
    }).collect()
}

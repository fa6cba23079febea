use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schema::SchemaError;
use crate::types::{deserialize_amount, Confidence};

/// What the revenue column of a statement actually holds.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueUnit {
    /// Currency amounts, used as-is.
    #[default]
    Currency,
    /// Minor units; divided by 100.
    Cents,
    /// A rate in basis points applied to the volume column.
    BasisPoints
}

/// Inclusive bounds for a plausible monthly residual, in currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevenueRange {
    pub min: Decimal,
    pub max: Decimal
}

impl RevenueRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Declarative description of one processor's statement layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorSchema {
    pub processor_name: String,
    /// The true payout column. Must never name the volume column.
    pub revenue_field: String,
    pub volume_field: String,
    pub transaction_count_field: String,
    pub merchant_id_field: String,
    pub merchant_name_field: String,
    pub revenue_unit: RevenueUnit,
    pub revenue_range: RevenueRange,
    pub confidence_threshold: Confidence
}

impl ProcessorSchema {
    /// Checks the invariants every registered schema must hold.
    ///
    /// # Errors
    /// Returns `SchemaError::InvalidSchema` naming the first broken invariant.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let processor = self.processor_name.as_str();

        if processor.trim().is_empty() {
            return Err(SchemaError::invalid_schema(processor, "processor name is empty"));
        }

        let fields = [
            ("revenue", &self.revenue_field),
            ("volume", &self.volume_field),
            ("transaction count", &self.transaction_count_field),
            ("merchant id", &self.merchant_id_field),
            ("merchant name", &self.merchant_name_field)
        ];

        if let Some((name, _)) = fields.iter().find(|(_, column)| column.trim().is_empty()) {
            return Err(SchemaError::invalid_schema(processor, format!("{name} field is empty")));
        }

        if self.revenue_field.trim().eq_ignore_ascii_case(self.volume_field.trim()) {
            return Err(SchemaError::invalid_schema(
                processor,
                format!("revenue field [{}] is also the volume field", self.revenue_field)
            ));
        }

        if self.revenue_range.min > self.revenue_range.max {
            return Err(SchemaError::invalid_schema(
                processor,
                format!("revenue range min [{}] exceeds max [{}]", self.revenue_range.min, self.revenue_range.max)
            ));
        }

        Ok(())
    }

    /// The columns this schema reads, in extraction order.
    pub fn mapped_columns(&self) -> [&str; 5] {
        [
            self.merchant_id_field.as_str(),
            self.merchant_name_field.as_str(),
            self.revenue_field.as_str(),
            self.volume_field.as_str(),
            self.transaction_count_field.as_str()
        ]
    }
}

/// One row of a schema configuration file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SchemaConfigRow {
    processor: String,
    revenue_field: String,
    volume_field: String,
    transaction_count_field: String,
    merchant_id_field: String,
    merchant_name_field: String,
    #[serde(default)]
    revenue_unit: Option<RevenueUnit>,
    #[serde(deserialize_with = "deserialize_amount")]
    revenue_min: Decimal,
    #[serde(deserialize_with = "deserialize_amount")]
    revenue_max: Decimal,
    confidence_threshold: Confidence
}

impl From<SchemaConfigRow> for ProcessorSchema {
    fn from(row: SchemaConfigRow) -> Self {
        Self {
            processor_name: row.processor,
            revenue_field: row.revenue_field,
            volume_field: row.volume_field,
            transaction_count_field: row.transaction_count_field,
            merchant_id_field: row.merchant_id_field,
            merchant_name_field: row.merchant_name_field,
            revenue_unit: row.revenue_unit.unwrap_or_default(),
            revenue_range: RevenueRange::new(row.revenue_min, row.revenue_max),
            confidence_threshold: row.confidence_threshold
        }
    }
}

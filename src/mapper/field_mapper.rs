use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::mapper::MappingError;
use crate::models::{AuditAction, AuditEntry, CandidateRecord, IssueKind, ValidationIssue};
use crate::parser::RawRow;
use crate::schema::{ProcessorSchema, RevenueUnit};
use crate::types::{is_blank, parse_amount, parse_count, round_amount, strip_quotes, AmountError, Confidence, LineNumber};

const CONFIDENCE_PENALTY: u8 = 20;
const BASIS_POINTS_PER_UNIT: i64 = 10_000;
const CENTS_PER_UNIT: i64 = 100;

/// A candidate record together with everything the mapper decided while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub record: CandidateRecord,
    /// Warnings raised during mapping, handed to the validator with the record.
    pub issues: Vec<ValidationIssue>,
    /// One entry per extraction, in extraction order, plus a closing `record-mapped` entry.
    pub audit: Vec<AuditEntry>
}

enum Coercion<T> {
    Parsed(T),
    Blank,
    Fallback(AmountError),
    Absent
}

struct Extraction<'a, T> {
    field: &'a str,
    raw: Option<&'a str>,
    coercion: Coercion<T>
}

impl<T: Copy + Default + ToString> Extraction<'_, T> {
    fn value(&self) -> T {
        match self.coercion {
            Coercion::Parsed(value) => value,
            _ => T::default()
        }
    }

    fn used_fallback(&self) -> bool {
        matches!(self.coercion, Coercion::Fallback(_) | Coercion::Absent)
    }

    fn fallback_detail(&self) -> Option<String> {
        match &self.coercion {
            Coercion::Fallback(error) => Some(error.to_string()),
            Coercion::Absent => Some("column is missing from the statement header".to_string()),
            _ => None
        }
    }

    fn entry(&self, processor_name: &str, line_number: LineNumber, before: Confidence, after: Confidence) -> AuditEntry {
        let action = match self.coercion {
            Coercion::Parsed(_) => AuditAction::FieldMapped,
            _ => AuditAction::FieldDefaulted
        };

        let mut entry = AuditEntry::new(action, processor_name, Some(line_number))
            .field(self.field)
            .after(self.value().to_string())
            .confidence(after, confidence_delta(before, after));

        if let Some(raw) = self.raw {
            entry = entry.before(raw);
        }

        entry
    }
}

/// Turns parsed statement rows into typed candidate records for one processor.
///
/// The mapper scores how much it trusts each record but never rejects on that score;
/// rejection is left to the validator so every mapping decision stays visible in the audit
/// trail. The only rows it refuses are rows with no merchant identity.
pub struct FieldMapper<'a> {
    schema: &'a ProcessorSchema
}

impl<'a> FieldMapper<'a> {
    pub fn new(schema: &'a ProcessorSchema) -> Self {
        Self { schema }
    }

    /// Maps one row.
    ///
    /// # Errors
    /// Returns `MappingError::MissingIdentifier` when the merchant id or name is absent or blank.
    pub fn map_row(&self, row: &RawRow) -> Result<MappedRow, MappingError> {
        let schema = self.schema;
        let processor = schema.processor_name.as_str();
        let line_number = row.line_number();

        let merchant_id = identifier(row, &schema.merchant_id_field)?;
        let merchant_name = identifier(row, &schema.merchant_name_field)?;

        let revenue = extract(row, &schema.revenue_field, parse_amount);
        let volume = extract(row, &schema.volume_field, parse_amount);
        let transactions = extract(row, &schema.transaction_count_field, parse_count);

        let mut audit = vec![
            identifier_entry(processor, line_number, &schema.merchant_id_field, row, &merchant_id),
            identifier_entry(processor, line_number, &schema.merchant_name_field, row, &merchant_name)
        ];

        let mut confidence = Confidence::MAX;

        let stated_revenue = revenue.value();
        let conversion = self.convert_revenue(stated_revenue, volume.value());
        let conversion_overflowed = conversion.is_none();
        let converted_revenue = conversion.unwrap_or_default();
        let revenue_out_of_range = !schema.revenue_range.contains(converted_revenue);

        if schema.revenue_unit == RevenueUnit::Currency {
            let penalties = u8::from(revenue.used_fallback()) + u8::from(revenue_out_of_range);
            let after = penalize(confidence, penalties);
            audit.push(revenue.entry(processor, line_number, confidence, after));
            confidence = after;
        } else {
            let after = penalize(confidence, u8::from(revenue.used_fallback()));
            audit.push(revenue.entry(processor, line_number, confidence, after));
            confidence = after;

            let after = penalize(confidence, u8::from(revenue_out_of_range) + u8::from(conversion_overflowed));
            audit.push(
                AuditEntry::new(AuditAction::UnitConverted, processor, Some(line_number))
                    .field(&schema.revenue_field)
                    .before(format!("{stated_revenue} {:?}", schema.revenue_unit))
                    .after(converted_revenue.to_string())
                    .confidence(after, confidence_delta(confidence, after))
            );
            confidence = after;
        }

        let after = penalize(confidence, u8::from(volume.used_fallback()));
        audit.push(volume.entry(processor, line_number, confidence, after));
        confidence = after;

        let reported_zero_transactions = matches!(transactions.coercion, Coercion::Parsed(0) | Coercion::Blank);
        let unexplained_revenue = reported_zero_transactions && !converted_revenue.is_zero();
        let after = penalize(confidence, u8::from(transactions.used_fallback()) + u8::from(unexplained_revenue));
        audit.push(transactions.entry(processor, line_number, confidence, after));
        confidence = after;

        let record = CandidateRecord {
            merchant_id,
            merchant_name,
            revenue: converted_revenue,
            volume: volume.value(),
            transaction_count: transactions.value(),
            processor_name: processor.to_string(),
            source_line: line_number,
            mapping_confidence: confidence
        };

        let mut issues = Vec::new();

        for (field, detail) in [
            (revenue.field, revenue.fallback_detail()),
            (volume.field, volume.fallback_detail()),
            (transactions.field, transactions.fallback_detail())
        ] {
            if let Some(detail) = detail {
                warn!("Line [{line_number}] merchant [{}]: field [{field}] defaulted to 0: {detail}", record.merchant_id);
                issues.push(ValidationIssue::coercion_fallback(&record, field, &detail));
            }
        }

        if conversion_overflowed {
            let detail = format!("{stated_revenue} {:?} of volume {} exceeds the decimal range", schema.revenue_unit, record.volume);
            warn!("Line [{line_number}] merchant [{}]: field [{}] defaulted to 0: {detail}", record.merchant_id, revenue.field);
            issues.push(ValidationIssue::coercion_fallback(&record, revenue.field, &detail));
        }

        if confidence < schema.confidence_threshold {
            let kind = if revenue_out_of_range { IssueKind::OutOfRange } else { IssueKind::MissingField };
            warn!(
                "Line [{line_number}] merchant [{}]: mapping confidence [{confidence}] is below threshold [{}]",
                record.merchant_id,
                schema.confidence_threshold
            );
            issues.push(ValidationIssue::low_confidence(&record, kind, schema.confidence_threshold));
        }

        audit.push(
            AuditEntry::new(AuditAction::RecordMapped, processor, Some(line_number))
                .after(format!(
                    "merchant={} revenue={} volume={} transactions={}",
                    record.merchant_id,
                    record.revenue,
                    record.volume,
                    record.transaction_count
                ))
                .confidence(confidence, confidence_delta(Confidence::MAX, confidence))
        );

        debug!(
            "Line [{line_number}] mapped merchant [{}] revenue [{}] with confidence [{confidence}]",
            record.merchant_id,
            record.revenue
        );

        Ok(MappedRow { record, issues, audit })
    }

    /// Converts stated revenue into currency units, or `None` when the result does not fit
    /// in a decimal.
    fn convert_revenue(&self, stated: Decimal, volume: Decimal) -> Option<Decimal> {
        match self.schema.revenue_unit {
            RevenueUnit::Currency => Some(stated),
            RevenueUnit::Cents => stated.checked_div(Decimal::from(CENTS_PER_UNIT)).map(round_amount),
            RevenueUnit::BasisPoints => volume.checked_mul(stated)
                .and_then(|product| product.checked_div(Decimal::from(BASIS_POINTS_PER_UNIT)))
                .map(round_amount)
        }
    }
}

fn identifier(row: &RawRow, field: &str) -> Result<String, MappingError> {
    let value = row.get(field).map(strip_quotes).unwrap_or_default();

    if value.is_empty() {
        warn!("Line [{}] skipped: identifier column [{field}] is empty", row.line_number());
        return Err(MappingError::missing_identifier(row.line_number(), field));
    }

    Ok(value.to_string())
}

fn identifier_entry(processor: &str, line_number: LineNumber, field: &str, row: &RawRow, value: &str) -> AuditEntry {
    let mut entry = AuditEntry::new(AuditAction::FieldMapped, processor, Some(line_number))
        .field(field)
        .after(value);

    if let Some(raw) = row.get(field) {
        entry = entry.before(raw);
    }

    entry
}

fn extract<'a, T>(row: &'a RawRow, field: &'a str, parse: fn(&str) -> Result<T, AmountError>) -> Extraction<'a, T> {
    let raw = row.get(field);

    let coercion = match raw {
        None => Coercion::Absent,
        Some(value) if is_blank(value) => Coercion::Blank,
        Some(value) => match parse(value) {
            Ok(parsed) => Coercion::Parsed(parsed),
            Err(error) => Coercion::Fallback(error)
        }
    };

    Extraction { field, raw, coercion }
}

fn penalize(confidence: Confidence, penalties: u8) -> Confidence {
    confidence.penalize(CONFIDENCE_PENALTY.saturating_mul(penalties))
}

fn confidence_delta(before: Confidence, after: Confidence) -> i16 {
    i16::from(after.value()) - i16::from(before.value())
}

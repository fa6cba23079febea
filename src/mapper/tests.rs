use super::{FieldMapper, MappingError};
use crate::models::{AuditAction, IssueKind, Severity};
use crate::parser::{parse_row, RawRow};
use crate::schema::{ProcessorSchema, RevenueRange, RevenueUnit};
use crate::types::Confidence;
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

const HEADER: [&str; 5] = ["MID", "Name", "Net", "Sales", "Transactions"];

fn create_schema(max: i64, unit: RevenueUnit) -> ProcessorSchema {
    ProcessorSchema {
        processor_name: "clearent".to_string(),
        revenue_field: "Net".to_string(),
        volume_field: "Sales".to_string(),
        transaction_count_field: "Transactions".to_string(),
        merchant_id_field: "MID".to_string(),
        merchant_name_field: "Name".to_string(),
        revenue_unit: unit,
        revenue_range: RevenueRange::new(Decimal::ZERO, Decimal::from(max)),
        confidence_threshold: Confidence::new(70).unwrap_or_default()
    }
}

fn create_row(header: &[&str], line: &str) -> Result<RawRow> {
    let columns: Arc<[String]> = header.iter().map(|column| column.to_string()).collect();
    Ok(parse_row(line, &columns, 2)?)
}

#[test]
fn test_mapper_extracts_typed_record_from_well_formed_row() -> Result<()> {
    let schema = create_schema(10_000, RevenueUnit::Currency);
    let row = create_row(&HEADER, "M1,Acme,\"1,025.83\",\"$88,000.00\",412")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.merchant_id, "M1");
    assert_eq!(mapped.record.merchant_name, "Acme");
    assert_eq!(mapped.record.revenue, Decimal::from_str("1025.83")?);
    assert_eq!(mapped.record.volume, Decimal::from_str("88000.00")?);
    assert_eq!(mapped.record.transaction_count, 412);
    assert_eq!(mapped.record.source_line, 2);
    assert_eq!(mapped.record.mapping_confidence, Confidence::MAX);
    assert!(mapped.issues.is_empty());

    Ok(())
}

#[test]
fn test_mapper_penalizes_revenue_without_transactions() -> Result<()> {
    let schema = create_schema(10_000, RevenueUnit::Currency);
    let row = create_row(&HEADER, "M1,Acme,25.83,0,0")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.revenue, Decimal::from_str("25.83")?);
    assert_eq!(mapped.record.mapping_confidence.value(), 80);
    assert!(mapped.issues.is_empty());

    Ok(())
}

#[test]
fn test_mapper_keeps_out_of_range_record_and_lowers_confidence() -> Result<()> {
    let schema = create_schema(5_000, RevenueUnit::Currency);
    let row = create_row(&HEADER, "M2,Big Box,707445.00,9000000,1200")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.revenue, Decimal::from_str("707445.00")?);
    assert_eq!(mapped.record.mapping_confidence.value(), 80);

    let revenue_entry = mapped.audit.iter()
        .find(|entry| entry.field.as_deref() == Some("Net"))
        .map(|entry| entry.confidence_delta);

    assert_eq!(revenue_entry, Some(-20));

    Ok(())
}

#[test]
fn test_mapper_defaults_garbage_to_zero_with_a_warning() -> Result<()> {
    let schema = create_schema(10_000, RevenueUnit::Currency);
    let row = create_row(&HEADER, "M3,Corner Cafe,N/A,1500.00,12")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert!(mapped.record.revenue.is_zero());
    assert_eq!(mapped.record.mapping_confidence.value(), 80);
    assert_eq!(mapped.issues.len(), 1);
    assert_eq!(mapped.issues[0].kind, IssueKind::MissingField);
    assert_eq!(mapped.issues[0].severity, Severity::Warning);
    assert!(mapped.issues[0].message.contains("[Net]"));

    let defaulted = mapped.audit.iter()
        .find(|entry| entry.action == AuditAction::FieldDefaulted)
        .ok_or_else(|| anyhow!("No field-defaulted audit entry"))?;

    assert_eq!(defaulted.before_value.as_deref(), Some("N/A"));
    assert_eq!(defaulted.after_value.as_deref(), Some("0"));

    Ok(())
}

#[test]
fn test_mapper_treats_blank_amounts_as_zero_without_penalty() -> Result<()> {
    let schema = create_schema(10_000, RevenueUnit::Currency);
    let row = create_row(&HEADER, "M4,Quiet Shop,,,")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert!(mapped.record.revenue.is_zero());
    assert!(mapped.record.volume.is_zero());
    assert_eq!(mapped.record.transaction_count, 0);
    assert_eq!(mapped.record.mapping_confidence, Confidence::MAX);
    assert!(mapped.issues.is_empty());
    assert_eq!(mapped.audit.iter().filter(|entry| entry.action == AuditAction::FieldDefaulted).count(), 3);

    Ok(())
}

#[test]
fn test_mapper_flags_low_confidence_without_rejecting() -> Result<()> {
    let schema = create_schema(10_000, RevenueUnit::Currency);
    let header = ["MID", "Name", "Net"];
    let row = create_row(&header, "M5,Missing Columns,20.00")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.mapping_confidence.value(), 60);

    let kinds: Vec<IssueKind> = mapped.issues.iter().map(|issue| issue.kind).collect();

    assert_eq!(kinds, vec![IssueKind::MissingField, IssueKind::MissingField, IssueKind::MissingField]);
    assert!(mapped.issues.iter().all(|issue| issue.severity == Severity::Warning));
    assert!(mapped.issues[2].message.contains("below the processor threshold"));

    Ok(())
}

#[test]
fn test_mapper_flags_low_confidence_caused_by_range_as_out_of_range() -> Result<()> {
    let schema = create_schema(5_000, RevenueUnit::Currency);
    let row = create_row(&HEADER, "M6,Volume Mixup,707445.00,garbage,0")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.mapping_confidence.value(), 40);
    assert_eq!(mapped.issues.last().map(|issue| issue.kind), Some(IssueKind::OutOfRange));

    Ok(())
}

#[test]
fn test_mapper_accumulates_one_penalty_per_failed_check() -> Result<()> {
    let mut schema = create_schema(5_000, RevenueUnit::Currency);
    schema.volume_field = "Gross".to_string();
    schema.transaction_count_field = "Count".to_string();
    let row = create_row(&["MID", "Name", "Net"], "M7,Nothing Fits,bogus")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.mapping_confidence, Confidence::new(40).unwrap_or_default());

    schema.revenue_range = RevenueRange::new(Decimal::ONE, Decimal::TEN);
    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.mapping_confidence, Confidence::new(20).unwrap_or_default());

    Ok(())
}

#[test]
fn test_mapper_rejects_rows_without_identifiers() -> Result<()> {
    let schema = create_schema(10_000, RevenueUnit::Currency);

    let blank_id = create_row(&HEADER, "  \"\" ,Acme,25.83,0,1")?;
    assert_eq!(
        FieldMapper::new(&schema).map_row(&blank_id),
        Err(MappingError::missing_identifier(2, "MID"))
    );

    let blank_name = create_row(&HEADER, "M1, ,25.83,0,1")?;
    assert_eq!(
        FieldMapper::new(&schema).map_row(&blank_name),
        Err(MappingError::missing_identifier(2, "Name"))
    );

    Ok(())
}

#[test]
fn test_mapper_converts_basis_points_against_volume() -> Result<()> {
    let mut schema = create_schema(5_000, RevenueUnit::BasisPoints);
    schema.revenue_field = "Residual BPS".to_string();
    let header = ["MID", "Name", "Residual BPS", "Sales", "Transactions"];
    let row = create_row(&header, "M8,Bakery,12.5,\"40,000.00\",310")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.revenue, Decimal::from(50));
    assert_eq!(mapped.record.mapping_confidence, Confidence::MAX);

    let conversion = mapped.audit.iter()
        .find(|entry| entry.action == AuditAction::UnitConverted)
        .ok_or_else(|| anyhow!("No unit-converted audit entry"))?;

    let converted = conversion.after_value.as_deref().map(Decimal::from_str).transpose()?;

    assert_eq!(converted, Some(Decimal::from(50)));

    Ok(())
}

#[test]
fn test_mapper_defaults_basis_points_that_overflow_on_conversion() -> Result<()> {
    let mut schema = create_schema(5_000, RevenueUnit::BasisPoints);
    schema.revenue_field = "Residual BPS".to_string();
    let header = ["MID", "Name", "Residual BPS", "Sales", "Transactions"];
    let row = create_row(&header, "M1,Acme,1000000000000000,1000000000000000,1")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.revenue, Decimal::ZERO);
    assert_eq!(mapped.record.volume, Decimal::from(1_000_000_000_000_000_i64));
    assert_eq!(mapped.record.mapping_confidence.value(), 80);
    assert_eq!(mapped.issues.len(), 1);
    assert_eq!(mapped.issues[0].kind, IssueKind::MissingField);
    assert_eq!(mapped.issues[0].severity, Severity::Warning);
    assert!(mapped.issues[0].message.contains("Residual BPS"));

    let conversion = mapped.audit.iter()
        .find(|entry| entry.action == AuditAction::UnitConverted)
        .ok_or_else(|| anyhow!("No unit-converted audit entry"))?;

    assert_eq!(conversion.after_value.as_deref(), Some("0"));
    assert_eq!(conversion.confidence_delta, -20);

    Ok(())
}

#[test]
fn test_mapper_converts_cents_to_currency() -> Result<()> {
    let schema = create_schema(5_000, RevenueUnit::Cents);
    let row = create_row(&HEADER, "M9,Deli,2583,1000,10")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;

    assert_eq!(mapped.record.revenue, Decimal::from_str("25.83")?);

    Ok(())
}

#[test]
fn test_mapper_audits_every_extraction_in_order() -> Result<()> {
    let schema = create_schema(10_000, RevenueUnit::Currency);
    let row = create_row(&HEADER, "M1,Acme,25.83,0,0")?;

    let mapped = FieldMapper::new(&schema).map_row(&row)?;
    let fields: Vec<Option<&str>> = mapped.audit.iter().map(|entry| entry.field.as_deref()).collect();

    assert_eq!(fields, vec![Some("MID"), Some("Name"), Some("Net"), Some("Sales"), Some("Transactions"), None]);
    assert_eq!(mapped.audit[4].confidence_delta, -20);

    let summary = mapped.audit.last().ok_or_else(|| anyhow!("No audit entries"))?;

    assert_eq!(summary.action, AuditAction::RecordMapped);
    assert_eq!(summary.confidence.value(), 80);
    assert_eq!(summary.confidence_delta, -20);
    assert!(mapped.audit.iter().all(|entry| entry.processor_name == "clearent" && entry.source_line == Some(2)));

    Ok(())
}

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use anyhow::{anyhow, Result};
use tempfile::tempdir;

const OUTPUT_HEADER: &str = "merchant_id,merchant_name,revenue,volume,transaction_count,confidence";

fn sample(name: &str) -> String {
    Path::new("samples").join(name).to_string_lossy().to_string()
}

fn run_cli(args: &[&str], audit_path: &Path) -> Result<Output> {
    let binary_path = env!("CARGO_BIN_EXE_residual-ingest");

    let output = Command::new(binary_path)
        .args(args)
        .arg("--audit")
        .arg(audit_path)
        .output()?;

    Ok(output)
}

fn parse_records(output: &Output) -> Result<HashMap<String, Vec<String>>> {
    let stdout = String::from_utf8(output.stdout.clone())?;
    let mut lines = stdout.lines();

    assert_eq!(lines.next(), Some(OUTPUT_HEADER));

    let mut records = HashMap::new();

    for line in lines {
        let fields: Vec<String> = line.split(',').map(str::to_string).collect();

        assert_eq!(fields.len(), 6, "Unexpected output row: {line}");

        if records.insert(fields[0].clone(), fields).is_some() {
            return Err(anyhow!("Merchant appears twice in output: {line}"));
        }
    }

    Ok(records)
}

#[test]
fn test_cli_outputs_only_accepted_records() -> Result<()> {
    let directory = tempdir()?;
    let audit_path = directory.path().join("audit.csv");
    let statement = sample("clearent_march.csv");

    let output = run_cli(&["--processor", "clearent", statement.as_str()], &audit_path)?;

    assert!(output.status.success());

    let records = parse_records(&output)?;
    let mut merchants: Vec<&str> = records.keys().map(String::as_str).collect();
    merchants.sort_unstable();

    assert_eq!(merchants, vec!["M100", "M101", "M102", "M104"]);

    let acme = records.get("M100").ok_or_else(|| anyhow!("M100 missing"))?;

    assert_eq!(acme[2], "1025.83");
    assert_eq!(acme[3], "88000.00");
    assert_eq!(acme[4], "412");
    assert_eq!(acme[5], "100");

    let cafe = records.get("M101").ok_or_else(|| anyhow!("M101 missing"))?;

    assert_eq!(cafe[2], "25.83");
    assert_eq!(cafe[5], "80");

    Ok(())
}

#[test]
fn test_cli_detects_processor_and_uses_prior_month() -> Result<()> {
    let directory = tempdir()?;
    let audit_path = directory.path().join("audit.csv");
    let statement = sample("clearent_march.csv");
    let prior = sample("clearent_february.csv");

    let output = run_cli(
        &[statement.as_str(), "--prior", prior.as_str(), "--log-level", "warn"],
        &audit_path
    )?;

    assert!(output.status.success());
    assert_eq!(parse_records(&output)?.len(), 4);

    let stderr = String::from_utf8(output.stderr)?;

    assert!(stderr.contains("MonthOverMonthVariance"));
    assert!(stderr.contains("M104"));

    Ok(())
}

#[test]
fn test_cli_writes_audit_trail() -> Result<()> {
    let directory = tempdir()?;
    let audit_path = directory.path().join("audit.csv");
    let statement = sample("clearent_march.csv");

    for _ in 0..2 {
        let output = run_cli(&["--processor", "clearent", statement.as_str()], &audit_path)?;
        assert!(output.status.success());
    }

    let audit = fs::read_to_string(&audit_path)?;
    let headers = audit.lines().filter(|line| line.starts_with("timestamp,")).count();

    assert_eq!(headers, 1);
    assert!(audit.contains("field-mapped"));
    assert!(audit.contains("rejected"));
    assert!(audit.contains("row-skipped"));
    assert!(audit.lines().all(|line| line.starts_with("timestamp,") || line.contains("clearent")));

    Ok(())
}

#[test]
fn test_cli_loads_additional_schemas() -> Result<()> {
    let directory = tempdir()?;
    let audit_path = directory.path().join("audit.csv");
    let statement = sample("payroc_march.csv");
    let schemas = sample("schemas.csv");

    let output = run_cli(
        &["--processor", "payroc", "--schemas", schemas.as_str(), statement.as_str()],
        &audit_path
    )?;

    assert!(output.status.success());

    let records = parse_records(&output)?;
    let books = records.get("P-001").ok_or_else(|| anyhow!("P-001 missing"))?;

    assert_eq!(records.len(), 2);
    assert_eq!(books[2], "412.18");
    assert_eq!(books[3], "31400.00");

    Ok(())
}

#[test]
fn test_cli_fails_for_unknown_processor() -> Result<()> {
    let directory = tempdir()?;
    let audit_path = directory.path().join("audit.csv");
    let statement = sample("clearent_march.csv");

    let output = run_cli(&["--processor", "first_data", statement.as_str()], &audit_path)?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr)?;

    assert!(stderr.contains("first_data"));

    Ok(())
}

#[test]
fn test_cli_fails_on_unreadable_prior_month() -> Result<()> {
    let directory = tempdir()?;
    let audit_path = directory.path().join("audit.csv");
    let prior_path = directory.path().join("prior.csv");
    let statement = sample("clearent_march.csv");

    fs::write(
        &prior_path,
        "merchant_id,merchant_name,revenue,volume,transaction_count,confidence\n\
         M100,Acme Hardware,998.10,86000.00,401,100\n\
         M104,Northside Deli,not a number,9000.00,45,100\n"
    )?;

    let prior = prior_path.to_string_lossy().to_string();
    let output = run_cli(&["--processor", "clearent", statement.as_str(), "--prior", prior.as_str()], &audit_path)?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr)?;

    assert!(stderr.contains("prior month"));

    Ok(())
}

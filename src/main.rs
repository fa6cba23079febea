mod cli;

use std::fs;
use std::io::{stderr, stdout, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use residual_ingest::audit::{AuditRecorder, CsvAuditSink};
use residual_ingest::engine::IngestEngine;
use residual_ingest::models::{BatchResult, Severity, ValidatedRecord};
use residual_ingest::schema::SchemaRegistry;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::cli::Args;

const OUTPUT_HEADER: [&str; 6] = ["merchant_id", "merchant_name", "revenue", "volume", "transaction_count", "confidence"];

#[derive(Serialize)]
struct OutputRow<'a> {
    merchant_id: &'a str,
    merchant_name: &'a str,
    revenue: String,
    volume: String,
    transaction_count: u64,
    confidence: u8
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(parse_log_level(&args.log_level));

    run(args).await.inspect_err(|error| error!("Ingestion failed: {error:#}"))
}

async fn run(args: Args) -> Result<()> {
    let registry = SchemaRegistry::with_builtin_schemas()?;

    if let Some(path) = &args.schemas {
        registry.load_csv(path)
            .with_context(|| format!("Loading schemas from {}", path.display()))?;
    }

    let sink = CsvAuditSink::open(&args.audit)
        .with_context(|| format!("Opening audit trail {}", args.audit.display()))?;
    let recorder = Arc::new(AuditRecorder::new(Arc::new(sink)));

    let engine = IngestEngine::new(Arc::new(registry), recorder).with_workers(args.workers);

    let lines = read_lines(&args.statement)?;
    let prior = args.prior.as_deref().map(read_prior).transpose()?;

    let timer = Instant::now();
    let result = match &args.processor {
        Some(processor) => engine.ingest(processor, lines, prior.as_deref()).await?,
        None => engine.ingest_detected(lines, prior.as_deref()).await?
    };
    let duration = timer.elapsed();

    report(&result);
    info!("Ingested statement in: {duration:?}");

    write_results_to_stdout(&result)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Reading statement {}", path.display()))?;

    Ok(content.lines().map(str::to_string).collect())
}

fn read_prior(path: &Path) -> Result<Vec<ValidatedRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Opening prior month {}", path.display()))?;

    //NOTE: A dropped prior line would silently disable the variance check for that merchant,
    //      so one unreadable line fails the load.
    let records = reader.deserialize::<ValidatedRecord>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Reading prior month {}", path.display()))?;

    info!("Loaded [{}] prior month records from {}", records.len(), path.display());

    Ok(records)
}

fn report(result: &BatchResult) {
    for row_error in &result.row_errors {
        warn!("Line [{}] skipped: {}", row_error.line_number, row_error.reason);
    }

    for issue in &result.issues {
        let line = issue.source_line.map(|line| line.to_string()).unwrap_or_default();

        match issue.severity {
            Severity::Error => error!("Line [{line}] {:?} {}: {} ({})", issue.kind, issue.merchant_id, issue.message, issue.suggested_action),
            Severity::Warning => warn!("Line [{line}] {:?} {}: {} ({})", issue.kind, issue.merchant_id, issue.message, issue.suggested_action),
            Severity::Info => info!("Line [{line}] {:?} {}: {}", issue.kind, issue.merchant_id, issue.message)
        }
    }

    info!(
        "Processor [{}]: [{}] rows, [{}] valid, [{}] rejected, [{}] skipped, revenue [{}], volume [{}], transactions [{}]",
        result.processor_name,
        result.total_rows,
        result.valid_records.len(),
        result.rejected_records.len(),
        result.row_errors.len(),
        result.total_revenue,
        result.total_volume,
        result.total_transactions
    );
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the accepted records, so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(result: &BatchResult) -> Result<()> {
    let mut output = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(stdout().lock()));

    //NOTE: Written by hand so an empty batch still produces a header
    output.write_record(OUTPUT_HEADER)?;

    for record in &result.valid_records {
        output.serialize(OutputRow {
            merchant_id: &record.merchant_id,
            merchant_name: &record.merchant_name,
            revenue: record.revenue.to_string(),
            volume: record.volume.to_string(),
            transaction_count: record.transaction_count,
            confidence: record.mapping_confidence.value()
        })?;
    }

    output.flush()?;

    Ok(())
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinSet};
use tracing::{debug, info, warn};

use crate::audit::AuditRecorder;
use crate::engine::IngestionError;
use crate::mapper::{FieldMapper, MappedRow};
use crate::models::{AuditAction, AuditEntry, BatchResult, CandidateRecord, RowError, ValidatedRecord, ValidationIssue};
use crate::parser::{parse_header, parse_row};
use crate::schema::{ProcessorSchema, SchemaRegistry};
use crate::types::{Confidence, LineNumber};
use crate::validator::{Candidate, ValidationRules, Validator};

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_BACKPRESSURE: usize = 256;

enum RowOutcome {
    Mapped(MappedRow),
    Skipped(RowError)
}

impl RowOutcome {
    fn line_number(&self) -> LineNumber {
        match self {
            RowOutcome::Mapped(mapped) => mapped.record.source_line,
            RowOutcome::Skipped(error) => error.line_number
        }
    }
}

/// Runs one statement at a time through parse, map, validate, and audit.
///
/// Parsing and mapping fan out across workers; validation waits for every row because the
/// duplicate, outlier, and variance rules look at the whole batch. Batches share nothing but
/// the read-only registry and the recorder, so separate `ingest` calls may run concurrently.
pub struct IngestEngine {
    registry: Arc<SchemaRegistry>,
    recorder: Arc<AuditRecorder>,
    validator: Validator,
    workers: usize,
    backpressure: usize
}

impl IngestEngine {
    pub fn new(registry: Arc<SchemaRegistry>, recorder: Arc<AuditRecorder>) -> Self {
        Self {
            registry,
            recorder,
            validator: Validator::new(),
            workers: DEFAULT_WORKERS,
            backpressure: DEFAULT_BACKPRESSURE
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_backpressure(mut self, backpressure: usize) -> Self {
        self.backpressure = backpressure.max(1);
        self
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.validator = Validator::with_rules(rules);
        self
    }

    /// Ingests one month's statement for a named processor.
    ///
    /// The first non-blank line is the header. Malformed rows and rows without a merchant
    /// identity are skipped and reported in `row_errors`; they never fail the batch.
    ///
    /// # Errors
    /// Fails only when the processor has no schema or the audit trail cannot be written.
    pub async fn ingest(&self, processor_name: &str, raw_lines: Vec<String>, prior_month: Option<&[ValidatedRecord]>) -> Result<BatchResult, IngestionError> {
        let schema = self.registry.lookup(processor_name)?;

        self.run(schema, raw_lines, prior_month).await
    }

    /// Ingests a statement whose processor is recognized from its header row.
    pub async fn ingest_detected(&self, raw_lines: Vec<String>, prior_month: Option<&[ValidatedRecord]>) -> Result<BatchResult, IngestionError> {
        let columns = raw_lines.iter()
            .enumerate()
            .find(|(_, line)| !line.trim().is_empty())
            .and_then(|(index, line)| parse_header(line, index + 1).ok())
            .unwrap_or_default();

        let schema = self.registry.detect(&columns)
            .ok_or(IngestionError::SchemaNotDetected { columns })?;

        self.run(schema, raw_lines, prior_month).await
    }

    async fn run(&self, schema: Arc<ProcessorSchema>, raw_lines: Vec<String>, prior_month: Option<&[ValidatedRecord]>) -> Result<BatchResult, IngestionError> {
        let processor = schema.processor_name.clone();

        let mut lines = raw_lines.into_iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((header_line_number, header_line)) = lines.next() else {
            info!("Processor [{processor}]: statement has no header, nothing to ingest");
            return Ok(BatchResult::empty(&processor));
        };

        let columns: Arc<[String]> = match parse_header(&header_line, header_line_number) {
            Ok(columns) => columns.into(),
            Err(error) => {
                warn!("Processor [{processor}]: {error}");

                let mut result = BatchResult::empty(&processor);
                result.total_rows = lines.count();
                result.row_errors.push(RowError::from(&error));

                self.flush(skipped_entries(&result)).await?;
                return Ok(result);
            }
        };

        warn_on_missing_columns(&schema, &columns);

        let data_lines: Vec<(LineNumber, String)> = lines.collect();
        let total_rows = data_lines.len();

        let mut outcomes = self.map_rows(schema.clone(), columns, data_lines).await?;
        outcomes.sort_by_key(RowOutcome::line_number);

        let mut candidates = Vec::with_capacity(outcomes.len());
        let mut audit = Vec::new();
        let mut row_errors = Vec::new();

        for outcome in outcomes {
            match outcome {
                RowOutcome::Mapped(MappedRow { record, issues, audit: trail }) => {
                    audit.extend(trail);
                    candidates.push(Candidate { record, issues });
                }
                RowOutcome::Skipped(error) => row_errors.push(error)
            }
        }

        let mut result = self.validator.validate(&schema, candidates, prior_month);
        result.total_rows = total_rows;
        result.row_errors = row_errors;

        audit.extend(decision_entries(&result));
        audit.extend(skipped_entries(&result));

        let written = self.flush(audit).await?;

        info!(
            "Processor [{processor}]: [{}] rows, [{}] valid, [{}] rejected, [{}] skipped, [{written}] audit entries",
            result.total_rows,
            result.valid_records.len(),
            result.rejected_records.len(),
            result.row_errors.len()
        );

        Ok(result)
    }

    async fn map_rows(&self, schema: Arc<ProcessorSchema>, columns: Arc<[String]>, data_lines: Vec<(LineNumber, String)>) -> Result<Vec<RowOutcome>, IngestionError> {
        let (sender, mut receiver) = mpsc::channel::<RowOutcome>(self.backpressure);
        let chunk_size = data_lines.len().div_ceil(self.workers).max(1);
        let mut remaining = data_lines.into_iter();
        let mut workers = JoinSet::new();

        loop {
            let chunk: Vec<(LineNumber, String)> = remaining.by_ref().take(chunk_size).collect();

            if chunk.is_empty() {
                break;
            }

            let sender = sender.clone();
            let schema = schema.clone();
            let columns = columns.clone();

            workers.spawn(async move {
                let mapper = FieldMapper::new(&schema);

                for (line_number, line) in chunk {
                    if sender.send(map_line(&mapper, &columns, &line, line_number)).await.is_err() {
                        break;
                    }
                }
            });
        }

        //NOTE: Dropping the original sender lets the receiver finish once every worker is done
        drop(sender);

        let mut outcomes = Vec::new();

        while let Some(outcome) = receiver.recv().await {
            outcomes.push(outcome);
        }

        while let Some(joined) = workers.join_next().await {
            joined?;
        }

        Ok(outcomes)
    }

    async fn flush(&self, entries: Vec<AuditEntry>) -> Result<usize, IngestionError> {
        let recorder = self.recorder.clone();
        let written = spawn_blocking(move || recorder.record_all(entries)).await??;

        Ok(written)
    }
}

fn map_line(mapper: &FieldMapper<'_>, columns: &Arc<[String]>, line: &str, line_number: LineNumber) -> RowOutcome {
    let row = match parse_row(line, columns, line_number) {
        Ok(row) => row,
        Err(error) => {
            warn!("{error}");
            return RowOutcome::Skipped(RowError::from(&error));
        }
    };

    match mapper.map_row(&row) {
        Ok(mapped) => RowOutcome::Mapped(mapped),
        Err(error) => RowOutcome::Skipped(RowError::from(&error))
    }
}

fn warn_on_missing_columns(schema: &ProcessorSchema, columns: &[String]) {
    let missing: Vec<&str> = schema.mapped_columns()
        .into_iter()
        .filter(|wanted| !columns.iter().any(|column| column.trim().eq_ignore_ascii_case(wanted.trim())))
        .collect();

    if !missing.is_empty() {
        warn!(
            "Processor [{}]: statement header is missing schema columns {missing:?}",
            schema.processor_name
        );
    }
}

/// One `validated` or `rejected` entry per record, followed by a `flagged` entry for each
/// warning or info issue on that record, in line order.
fn decision_entries(result: &BatchResult) -> Vec<AuditEntry> {
    let processor = result.processor_name.as_str();

    let mut flags = HashMap::<LineNumber, Vec<&ValidationIssue>>::new();

    for issue in result.issues.iter().filter(|issue| !issue.is_error()) {
        if let Some(line_number) = issue.source_line {
            flags.entry(line_number).or_default().push(issue);
        }
    }

    let mut decisions: Vec<(&CandidateRecord, Option<&[ValidationIssue]>)> = result.valid_records.iter()
        .map(|record| (record, None))
        .chain(result.rejected_records.iter().map(|rejected| (&rejected.record, Some(rejected.issues.as_slice()))))
        .collect();

    decisions.sort_by_key(|(record, _)| record.source_line);

    let mut entries = Vec::with_capacity(decisions.len() + flags.len());

    for (record, rejection) in decisions {
        let line_number = Some(record.source_line);

        let decision = match rejection {
            None => AuditEntry::new(AuditAction::Validated, processor, line_number).after("accepted"),
            Some(issues) => {
                let errors: Vec<String> = issues.iter()
                    .filter(|issue| issue.is_error())
                    .map(|issue| issue.kind.to_string())
                    .collect();

                AuditEntry::new(AuditAction::Rejected, processor, line_number).after(errors.join(";"))
            }
        };

        entries.push(
            decision
                .before(record.revenue.to_string())
                .confidence(record.mapping_confidence, 0)
        );

        for issue in flags.remove(&record.source_line).unwrap_or_default() {
            debug!("Line [{}] flagged {:?}: {}", record.source_line, issue.kind, issue.message);

            entries.push(
                AuditEntry::new(AuditAction::Flagged, processor, line_number)
                    .before(issue.kind.to_string())
                    .after(issue.message.clone())
                    .confidence(record.mapping_confidence, 0)
            );
        }
    }

    entries
}

fn skipped_entries(result: &BatchResult) -> Vec<AuditEntry> {
    result.row_errors.iter()
        .map(|error| {
            AuditEntry::new(AuditAction::RowSkipped, &result.processor_name, Some(error.line_number))
                .after(error.reason.clone())
                .confidence(Confidence::MIN, 0)
        })
        .collect()
}

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::mapper::MappedRow;
use crate::models::{BatchResult, CandidateRecord, RejectedRecord, ValidatedRecord, ValidationIssue};
use crate::schema::ProcessorSchema;
use crate::types::LineNumber;
use crate::validator::ValidationRules;

/// A record on its way into validation, with any issues already raised while mapping it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub record: CandidateRecord,
    pub issues: Vec<ValidationIssue>
}

impl From<CandidateRecord> for Candidate {
    fn from(record: CandidateRecord) -> Self {
        Self { record, issues: Vec::new() }
    }
}

impl From<MappedRow> for Candidate {
    fn from(mapped: MappedRow) -> Self {
        Self {
            record: mapped.record,
            issues: mapped.issues
        }
    }
}

/// Applies the financial-integrity rules to one batch of candidates.
///
/// Rules run in a fixed order and never short-circuit, so a record can carry several issues.
/// Errors keep a record out of `valid_records`; warnings are kept for human review. Bad data
/// never makes this fail.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: ValidationRules
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Validates `candidates` in the order given; "first occurrence" for duplicates follows
    /// that order.
    pub fn validate<I, C>(&self, schema: &ProcessorSchema, candidates: I, prior_month: Option<&[ValidatedRecord]>) -> BatchResult
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        let mut candidates: Vec<Candidate> = candidates.into_iter().map(Into::into).collect();

        for candidate in candidates.iter_mut() {
            self.check_range(schema, candidate);
            self.check_consistency(candidate);
            self.check_ratio(candidate);
        }

        self.check_duplicates(&mut candidates);
        self.check_outliers(&mut candidates);

        if let Some(prior_month) = prior_month {
            self.check_variance(&mut candidates, prior_month);
        }

        let result = Self::collect(schema, candidates);

        info!(
            "Processor [{}]: [{}] valid, [{}] rejected, [{}] issues, total revenue [{}]",
            result.processor_name,
            result.valid_records.len(),
            result.rejected_records.len(),
            result.issues.len(),
            result.total_revenue
        );

        result
    }

    fn check_range(&self, schema: &ProcessorSchema, candidate: &mut Candidate) {
        let range = schema.revenue_range;

        if !range.contains(candidate.record.revenue) {
            let issue = ValidationIssue::out_of_range(&candidate.record, range.min, range.max);
            flag(candidate, issue);
        }
    }

    fn check_consistency(&self, candidate: &mut Candidate) {
        let record = &candidate.record;

        if record.revenue > Decimal::ZERO && record.transaction_count == 0 {
            let issue = ValidationIssue::revenue_without_transactions(record);
            flag(candidate, issue);
        }
    }

    fn check_ratio(&self, candidate: &mut Candidate) {
        let record = &candidate.record;

        if record.transaction_count == 0 {
            return;
        }

        let per_transaction = record.revenue / Decimal::from(record.transaction_count);
        let limit = self.rules.max_revenue_per_transaction;

        if per_transaction > limit {
            let issue = ValidationIssue::high_revenue_per_transaction(record, per_transaction, limit);
            flag(candidate, issue);
        }
    }

    //NOTE: Each processor's MID namespace is independent, so duplicates are only looked for
    //      inside the current batch.
    fn check_duplicates(&self, candidates: &mut [Candidate]) {
        let mut first_seen = HashMap::<String, LineNumber>::new();

        for candidate in candidates.iter_mut() {
            let record = &candidate.record;

            match first_seen.get(&record.merchant_id) {
                Some(first_line) => {
                    let issue = ValidationIssue::duplicate_merchant_id(record, *first_line);
                    flag(candidate, issue);
                }
                None => {
                    first_seen.insert(record.merchant_id.clone(), record.source_line);
                }
            }
        }
    }

    fn check_outliers(&self, candidates: &mut [Candidate]) {
        if candidates.is_empty() {
            return;
        }

        let multiple = self.rules.outlier_multiple;

        let threshold = candidates.iter()
            .try_fold(Decimal::ZERO, |total, candidate| total.checked_add(candidate.record.revenue))
            .and_then(|total| total.checked_div(Decimal::from(candidates.len())))
            .and_then(|mean| Some((mean, mean.checked_mul(multiple)?)));

        let Some((mean, threshold)) = threshold else {
            debug!("Batch revenue exceeds the decimal range; outlier check skipped");
            return;
        };

        if mean <= Decimal::ZERO {
            return;
        }

        for candidate in candidates.iter_mut() {
            if candidate.record.revenue > threshold {
                let issue = ValidationIssue::statistical_outlier(&candidate.record, mean, multiple);
                flag(candidate, issue);
            }
        }
    }

    fn check_variance(&self, candidates: &mut [Candidate], prior_month: &[ValidatedRecord]) {
        //NOTE: None marks a merchant whose prior rows overflow when summed
        let mut prior_revenue = HashMap::<&str, Option<Decimal>>::new();

        for record in prior_month {
            let total = prior_revenue.entry(record.merchant_id.as_str()).or_insert(Some(Decimal::ZERO));
            *total = total.and_then(|total| total.checked_add(record.revenue));
        }

        for candidate in candidates.iter_mut() {
            let Some(prior) = prior_revenue.get(candidate.record.merchant_id.as_str()).copied() else {
                continue;
            };

            let Some(prior) = prior else {
                debug!("Merchant [{}] prior revenue exceeds the decimal range; variance check skipped", candidate.record.merchant_id);
                continue;
            };

            if prior.is_zero() {
                debug!("Merchant [{}] had no prior revenue; variance check skipped", candidate.record.merchant_id);
                continue;
            }

            //NOTE: A difference too large to represent is an unbounded change
            let change = candidate.record.revenue.checked_sub(prior)
                .and_then(|difference| difference.abs().checked_div(prior.abs()))
                .unwrap_or(Decimal::MAX);

            if change > self.rules.max_month_over_month_change {
                let issue = ValidationIssue::month_over_month_variance(&candidate.record, prior, change);
                flag(candidate, issue);
            }
        }
    }

    fn collect(schema: &ProcessorSchema, candidates: Vec<Candidate>) -> BatchResult {
        let mut result = BatchResult::empty(&schema.processor_name);
        result.total_rows = candidates.len();

        for Candidate { record, mut issues } in candidates {
            if !issues.iter().any(ValidationIssue::is_error) {
                match Self::add_to_totals(&mut result, &record) {
                    Ok(()) => {
                        result.issues.extend(issues);
                        result.valid_records.push(record);
                        continue;
                    }
                    Err(field) => {
                        let issue = ValidationIssue::total_overflow(&record, field);
                        warn!("Line [{}] merchant [{}]: {}", record.source_line, record.merchant_id, issue.message);
                        issues.push(issue);
                    }
                }
            }

            result.issues.extend(issues.iter().cloned());
            result.rejected_records.push(RejectedRecord { record, issues });
        }

        result
    }

    /// Adds a record to the batch totals, or names the total it would overflow and leaves
    /// the totals untouched.
    fn add_to_totals(result: &mut BatchResult, record: &CandidateRecord) -> Result<(), &'static str> {
        let revenue = result.total_revenue.checked_add(record.revenue).ok_or("revenue")?;
        let volume = result.total_volume.checked_add(record.volume).ok_or("volume")?;
        let transactions = result.total_transactions.checked_add(record.transaction_count).ok_or("transaction count")?;

        result.total_revenue = revenue;
        result.total_volume = volume;
        result.total_transactions = transactions;

        Ok(())
    }
}

fn flag(candidate: &mut Candidate, issue: ValidationIssue) {
    debug!(
        "Line [{}] merchant [{}]: {:?} {:?} - {}",
        candidate.record.source_line,
        issue.merchant_id,
        issue.severity,
        issue.kind,
        issue.message
    );

    candidate.issues.push(issue);
}

//! Import reconciliation.
//!
//! Merges a prepared batch into a dataset one (kind, scenario) at a time.
//! Conflicts are never errors: the merge strategy decides, and the outcome
//! is reported as counts.

use serde::Serialize;
use tracing::{debug, info, warn};

use psi_model::{
    Dataset, ImportIssue, ImportOptions, MergeStrategy, Record, SchemaRegistry,
};

use crate::batch::ImportBatch;
use crate::validate::{PreparedGroup, prepare_batch};

/// What happened to one (kind, scenario).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    /// Incoming records were written.
    Applied,
    /// Existing data was present and the sub-batch was discarded.
    SkippedExisting,
    /// No valid rows reached the merge step.
    NothingToImport,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::SkippedExisting => "skipped (existing)",
            Self::NothingToImport => "nothing to import",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioOutcome {
    pub kind: String,
    pub scenario: Option<String>,
    pub strategy: MergeStrategy,
    pub status: OutcomeStatus,
    /// Valid incoming records after de-duplication.
    pub incoming: usize,
    pub inserted: usize,
    /// Existing records removed by `Replace`.
    pub removed: usize,
    /// Existing records left in place by `SkipExisting` or `Merge`.
    pub kept_existing: usize,
    pub rejected_rows: usize,
}

/// Result of a committed import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub outcomes: Vec<ScenarioOutcome>,
    pub total_rows: usize,
    pub blank_rows: usize,
    pub filtered_rows: usize,
    pub warnings: Vec<ImportIssue>,
    pub errors: Vec<ImportIssue>,
    /// Nothing was written because `stop_on_first_error` hit an error, or
    /// the import was refused before reconciliation.
    pub aborted: bool,
}

impl ImportReport {
    pub fn inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.inserted).sum()
    }

    pub fn removed(&self) -> usize {
        self.outcomes.iter().map(|o| o.removed).sum()
    }

    pub fn outcome(&self, kind: &str, scenario: Option<&str>) -> Option<&ScenarioOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.kind == kind && o.scenario.as_deref() == scenario)
    }

    pub fn is_clean(&self) -> bool {
        !self.aborted && self.errors.is_empty()
    }

    /// A report for an import refused before any row was reconciled.
    pub fn refused(errors: Vec<ImportIssue>) -> Self {
        Self {
            errors,
            aborted: true,
            ..Self::default()
        }
    }
}

/// Reconciles `batch` into `dataset`.
///
/// With `stop_on_first_error` the whole batch is validated first and any
/// error aborts the import with the dataset untouched. Otherwise invalid
/// rows are rejected and every (kind, scenario) is merged independently.
pub fn reconcile(
    dataset: &mut Dataset,
    batch: &ImportBatch,
    registry: &SchemaRegistry,
    options: &ImportOptions,
) -> ImportReport {
    let prepared = prepare_batch(batch, registry, options);
    let mut report = ImportReport {
        total_rows: prepared.total_rows,
        blank_rows: prepared.blank_rows,
        filtered_rows: prepared.filtered_rows,
        warnings: prepared.warnings,
        errors: prepared.errors,
        aborted: prepared.aborted,
        ..ImportReport::default()
    };
    if report.aborted {
        warn!(errors = report.errors.len(), "import aborted before any change");
        return report;
    }

    for group in prepared.groups.into_values() {
        let Some(schema) = registry.get(&group.kind) else {
            continue;
        };
        if let Err(error) = dataset.register_kind(schema.kind().clone()) {
            report.errors.push(
                ImportIssue::error(error.to_string())
                    .in_kind(group.kind.as_str())
                    .in_scenario(group.scenario.as_deref()),
            );
            continue;
        }
        let outcome = apply_group(dataset, group, options.merge_strategy, &mut report);
        debug!(
            kind = %outcome.kind,
            scenario = outcome.scenario.as_deref().unwrap_or("-"),
            status = outcome.status.as_str(),
            inserted = outcome.inserted,
            removed = outcome.removed,
            kept = outcome.kept_existing,
            "reconciled"
        );
        report.outcomes.push(outcome);
    }

    info!(
        strategy = %options.merge_strategy,
        inserted = report.inserted(),
        removed = report.removed(),
        warnings = report.warnings.len(),
        errors = report.errors.len(),
        "import complete"
    );
    report
}

fn apply_group(
    dataset: &mut Dataset,
    group: PreparedGroup,
    strategy: MergeStrategy,
    report: &mut ImportReport,
) -> ScenarioOutcome {
    let kind = group.kind;
    let scenario = group.scenario;
    let mut outcome = ScenarioOutcome {
        kind: kind.clone(),
        scenario: scenario.clone(),
        strategy,
        status: OutcomeStatus::Applied,
        incoming: group.records.len(),
        inserted: 0,
        removed: 0,
        kept_existing: 0,
        rejected_rows: group.rejected_rows,
    };
    if group.records.is_empty() {
        outcome.status = OutcomeStatus::NothingToImport;
        return outcome;
    }

    let existing = match &scenario {
        Some(s) => dataset.scenario_count(&kind, s),
        None => dataset.kind_len(&kind),
    };
    let records = group.records.into_values();

    match strategy {
        MergeStrategy::Replace => {
            outcome.removed = match &scenario {
                Some(s) => dataset.remove_scenario(&kind, s),
                None => dataset.clear_kind(&kind),
            };
            outcome.inserted = insert_all(dataset, &kind, scenario.as_deref(), records, report);
        }
        MergeStrategy::SkipExisting => {
            if existing > 0 {
                outcome.status = OutcomeStatus::SkippedExisting;
                outcome.kept_existing = existing;
            } else {
                outcome.inserted = insert_all(dataset, &kind, scenario.as_deref(), records, report);
            }
        }
        MergeStrategy::Merge => {
            let (fresh, overlapping): (Vec<Record>, Vec<Record>) =
                records.partition(|r| !dataset.contains_key(&kind, &r.key));
            outcome.kept_existing = overlapping.len();
            outcome.inserted = insert_all(dataset, &kind, scenario.as_deref(), fresh, report);
            if !overlapping.is_empty() {
                report.warnings.push(
                    ImportIssue::warning(format!(
                        "{} incoming record(s) matched existing keys and were not imported; \
                         existing fields may be stale",
                        overlapping.len()
                    ))
                    .in_kind(kind.as_str())
                    .in_scenario(scenario.as_deref()),
                );
            }
        }
    }
    outcome
}

fn insert_all(
    dataset: &mut Dataset,
    kind: &str,
    scenario: Option<&str>,
    records: impl IntoIterator<Item = Record>,
    report: &mut ImportReport,
) -> usize {
    let mut inserted = 0;
    for record in records {
        match dataset.insert(kind, record) {
            Ok(_) => inserted += 1,
            Err(error) => report.errors.push(
                ImportIssue::error(error.to_string())
                    .in_kind(kind)
                    .in_scenario(scenario),
            ),
        }
    }
    inserted
}

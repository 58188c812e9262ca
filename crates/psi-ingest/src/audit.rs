//! Read-only import preview.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use psi_map::MappingDocument;
use psi_map::utils::header_key;
use psi_model::{
    AssociationSet, DataTypeSchema, Dataset, ImportIssue, ImportOptions, MergeStrategy,
    SchemaRegistry, Severity, case_collisions,
};

use crate::batch::{ImportBatch, batch_from_table};
use crate::csv_table::{CsvTable, read_csv_table};
use crate::reconcile::{ImportReport, reconcile};
use crate::validate::{PreparedGroup, prepare_batch};

/// What an import would do, computed without touching the dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportAuditResult {
    pub detected_data_types: BTreeSet<String>,
    /// Scenario names after renames.
    pub discovered_scenarios: BTreeSet<String>,
    /// Valid rows per data type.
    pub per_data_type_counts: BTreeMap<String, usize>,
    /// Valid rows per data type and scenario.
    pub per_scenario_counts: BTreeMap<String, BTreeMap<String, usize>>,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub warnings: Vec<ImportIssue>,
    pub errors: Vec<ImportIssue>,
}

impl ImportAuditResult {
    pub fn can_import(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, issue: ImportIssue) {
        if issue.is_error() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }
}

/// Runs the import pipeline up to the merge step and reports what it finds.
pub fn audit_batch(
    dataset: &Dataset,
    batch: &ImportBatch,
    registry: &SchemaRegistry,
    options: &ImportOptions,
) -> ImportAuditResult {
    let prepared = prepare_batch(batch, registry, options);
    let aborted = prepared.aborted;
    let mut audit = ImportAuditResult {
        total_rows: prepared.total_rows,
        valid_rows: prepared.valid_rows(),
        warnings: prepared.warnings,
        errors: prepared.errors,
        ..ImportAuditResult::default()
    };

    for group in prepared.groups.values() {
        audit.detected_data_types.insert(group.kind.clone());
        *audit
            .per_data_type_counts
            .entry(group.kind.clone())
            .or_default() += group.records.len();

        let overlapping = group
            .records
            .keys()
            .filter(|k| dataset.contains_key(&group.kind, k))
            .count();
        if let Some(scenario) = &group.scenario {
            audit.discovered_scenarios.insert(scenario.clone());
            audit
                .per_scenario_counts
                .entry(group.kind.clone())
                .or_default()
                .insert(scenario.clone(), group.records.len());
        }
        overlap_warning(
            &mut audit,
            dataset,
            options.merge_strategy,
            group,
            overlapping,
        );
    }

    if aborted {
        audit.errors.push(ImportIssue::error(
            "preview stopped at the first error; counts cover only the rows read before it",
        ));
    }

    let mut names = dataset.scenarios();
    names.extend(audit.discovered_scenarios.iter().cloned());
    for collision in case_collisions(names) {
        audit.warnings.push(ImportIssue::warning(format!(
            "scenario names differ only by case and are kept apart: {}",
            collision.join(", ")
        )));
    }

    for (kind, counts) in &audit.per_scenario_counts {
        let distinct: BTreeSet<usize> = counts.values().copied().collect();
        if distinct.len() > 1 {
            let detail: Vec<String> = counts.iter().map(|(s, n)| format!("{s}={n}")).collect();
            audit.warnings.push(
                ImportIssue::warning(format!(
                    "scenarios have uneven record counts ({}); the file may be partial",
                    detail.join(", ")
                ))
                .in_kind(kind.as_str()),
            );
        }
    }

    audit
}

fn overlap_warning(
    audit: &mut ImportAuditResult,
    dataset: &Dataset,
    strategy: MergeStrategy,
    group: &PreparedGroup,
    overlapping: usize,
) {
    let kind = group.kind.as_str();
    let scenario = group.scenario.as_deref();
    let existing = match scenario {
        Some(s) => dataset.scenario_count(kind, s),
        None => dataset.kind_len(kind),
    };
    if existing == 0 {
        return;
    }
    let message = match strategy {
        MergeStrategy::Replace => {
            format!("{existing} existing record(s) will be replaced")
        }
        MergeStrategy::SkipExisting => {
            format!("{existing} existing record(s) present; incoming rows will be skipped")
        }
        MergeStrategy::Merge => {
            if overlapping == 0 {
                format!("{existing} existing record(s) present; only new keys will be added")
            } else {
                format!(
                    "{overlapping} incoming key(s) already exist and will keep their \
                     current fields, which may be stale"
                )
            }
        }
    };
    audit.warnings.push(
        ImportIssue::warning(message)
            .in_kind(kind)
            .in_scenario(scenario),
    );
}

/// A table read from disk with the batch its associations produce.
#[derive(Debug, Clone, Default)]
pub struct MappedFile {
    pub batch: ImportBatch,
    pub detected_data_types: BTreeSet<String>,
    /// Mapping problems found before any row was read.
    pub issues: Vec<ImportIssue>,
}

impl MappedFile {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ImportIssue::is_error)
    }
}

/// Detects the data types a table carries and builds their batches.
///
/// A data type is a candidate when every key property is mapped to a column
/// present in the table. A candidate whose key columns are a strict subset of
/// another candidate's key columns is dropped with a warning, so a file keyed
/// by `Id` and `Scenario` is not also read as a type keyed by `Id` alone.
///
/// For detected types, a required property with no association or an absent
/// column is an error; an absent non-required column is reported at its
/// association's severity.
pub fn map_table(
    table: &CsvTable,
    associations: &AssociationSet,
    registry: &SchemaRegistry,
) -> MappedFile {
    let mut mapped = MappedFile::default();

    let candidates: Vec<(&DataTypeSchema, BTreeSet<String>)> = registry
        .iter()
        .filter_map(|schema| {
            let kind = schema.kind();
            let columns = kind
                .key_properties()
                .iter()
                .map(|property| {
                    associations
                        .find_property(kind.name(), property)
                        .filter(|a| table.has_column(&a.column_header))
                        .map(|a| header_key(&a.column_header))
                })
                .collect::<Option<BTreeSet<String>>>()?;
            Some((schema, columns))
        })
        .collect();

    for (schema, key_columns) in &candidates {
        let kind = schema.kind();
        let covering = candidates.iter().find(|(other, other_columns)| {
            other.name() != kind.name()
                && key_columns.len() < other_columns.len()
                && key_columns.is_subset(other_columns)
        });
        if let Some((other, _)) = covering {
            debug!(
                data_type = kind.name(),
                covered_by = other.name(),
                "key columns covered by a wider data type"
            );
            mapped.issues.push(
                ImportIssue::warning(format!(
                    "key columns also identify {}; not imported as {}",
                    other.name(),
                    kind.name()
                ))
                .in_kind(kind.name()),
            );
            continue;
        }
        mapped.detected_data_types.insert(kind.name().to_string());

        for property in schema.catalog().properties() {
            let association = associations.find_property(kind.name(), &property.name);
            let issue = match association {
                None if property.required => Some(ImportIssue::error(format!(
                    "required property {} has no mapped column",
                    property.name
                ))),
                Some(a) if !table.has_column(&a.column_header) => {
                    let severity = if property.required {
                        Severity::Error
                    } else {
                        a.severity
                    };
                    Some(ImportIssue::new(
                        severity,
                        format!("mapped column '{}' is not in the file", a.column_header),
                    ))
                }
                _ => None,
            };
            if let Some(issue) = issue {
                mapped
                    .issues
                    .push(issue.in_kind(kind.name()).for_property(property.name.as_str()));
            }
        }

        match batch_from_table(table, associations, schema) {
            Ok(batch) => mapped.batch.extend(batch),
            Err(error) => mapped
                .issues
                .push(ImportIssue::error(error.to_string()).in_kind(kind.name())),
        }
    }

    if mapped.detected_data_types.is_empty() {
        mapped.issues.push(ImportIssue::error(
            "no data type detected: no type has all key properties mapped to columns in the file",
        ));
    }
    mapped
}

/// Reads a CSV file and audits it against a mapping document.
pub fn audit_file(
    path: &Path,
    document: &MappingDocument,
    registry: &SchemaRegistry,
    dataset: &Dataset,
    options: &ImportOptions,
) -> Result<ImportAuditResult> {
    let table = read_csv_table(path)?;
    let mapped = map_table(&table, document.associations(), registry);
    let mut audit = audit_batch(dataset, &mapped.batch, registry, options);
    audit
        .detected_data_types
        .extend(mapped.detected_data_types.iter().cloned());
    let preview = std::mem::take(&mut audit.errors);
    for issue in mapped.issues {
        audit.push(issue);
    }
    audit.errors.extend(preview);

    info!(
        path = %path.display(),
        data_types = audit.detected_data_types.len(),
        rows = audit.total_rows,
        valid = audit.valid_rows,
        errors = audit.errors.len(),
        "audit complete"
    );
    Ok(audit)
}

/// Reads a CSV file and imports it. Mapping errors refuse the import
/// without touching the dataset.
pub fn import_file(
    path: &Path,
    document: &MappingDocument,
    registry: &SchemaRegistry,
    dataset: &mut Dataset,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let table = read_csv_table(path)?;
    let mapped = map_table(&table, document.associations(), registry);
    if mapped.has_errors() {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            mapped.issues.into_iter().partition(ImportIssue::is_error);
        let mut report = ImportReport::refused(errors);
        report.warnings = warnings;
        return Ok(report);
    }
    let mut report = reconcile(dataset, &mapped.batch, registry, options);
    let mut warnings = mapped.issues;
    warnings.append(&mut report.warnings);
    report.warnings = warnings;
    Ok(report)
}

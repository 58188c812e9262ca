//! Row preparation shared by import and audit.
//!
//! Applies blank-row skipping, trimming, scenario selection and renames,
//! then validates each row and builds its record. Nothing here touches a
//! dataset.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use psi_model::{
    CompositeKey, DataTypeSchema, ImportIssue, ImportOptions, Record, SchemaRegistry,
};

use crate::batch::{ImportBatch, ParsedRow};

/// Identifies one reconciliation unit: a kind and, for scenario kinds, the
/// scenario after renames.
pub type GroupKey = (String, Option<String>);

/// Valid records for one (kind, scenario).
#[derive(Debug, Clone, Default)]
pub struct PreparedGroup {
    pub kind: String,
    pub scenario: Option<String>,
    /// Scenario names as they appeared in the source, before renames.
    pub source_scenarios: BTreeSet<String>,
    /// Valid records keyed by composite key; later rows replace earlier ones.
    pub records: BTreeMap<CompositeKey, Record>,
    pub rejected_rows: usize,
    pub duplicate_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    pub groups: BTreeMap<GroupKey, PreparedGroup>,
    pub total_rows: usize,
    pub blank_rows: usize,
    /// Rows dropped by scenario selection.
    pub filtered_rows: usize,
    pub warnings: Vec<ImportIssue>,
    pub errors: Vec<ImportIssue>,
    /// Set when `stop_on_first_error` cut preparation short.
    pub aborted: bool,
}

impl PreparedBatch {
    pub fn valid_rows(&self) -> usize {
        self.groups.values().map(|g| g.records.len()).sum()
    }

    fn group(&mut self, kind: &str, scenario: Option<&str>) -> &mut PreparedGroup {
        self.groups
            .entry((kind.to_string(), scenario.map(str::to_string)))
            .or_insert_with(|| PreparedGroup {
                kind: kind.to_string(),
                scenario: scenario.map(str::to_string),
                ..PreparedGroup::default()
            })
    }
}

/// Prepares a batch for import.
pub fn prepare_batch(
    batch: &ImportBatch,
    registry: &SchemaRegistry,
    options: &ImportOptions,
) -> PreparedBatch {
    let mut prepared = PreparedBatch::default();

    for sub_batch in &batch.sub_batches {
        prepared.total_rows += sub_batch.rows.len();

        let Some(schema) = registry.get(&sub_batch.kind) else {
            prepared.errors.push(
                ImportIssue::error(format!("unknown data type '{}'", sub_batch.kind))
                    .in_kind(sub_batch.kind.as_str()),
            );
            if options.stop_on_first_error {
                prepared.aborted = true;
                return prepared;
            }
            continue;
        };
        let kind_name = schema.name();
        let scenario_property = schema.kind().scenario_property();

        let source_scenario = sub_batch
            .scenario
            .as_deref()
            .filter(|_| scenario_property.is_some())
            .map(|s| clean(s, options));
        if let Some(source) = &source_scenario
            && !options.is_selected(source)
        {
            debug!(
                kind = kind_name,
                scenario = %source,
                rows = sub_batch.rows.len(),
                "scenario not selected"
            );
            prepared.filtered_rows += sub_batch.rows.len();
            continue;
        }

        for row in &sub_batch.rows {
            let mut fields: BTreeMap<String, String> = row
                .fields
                .iter()
                .map(|(property, value)| (property.clone(), clean(value, options)))
                .collect();

            if options.skip_blank_rows && fields.values().all(String::is_empty) {
                prepared.blank_rows += 1;
                continue;
            }

            let mut source = source_scenario.clone();
            if let Some(property) = scenario_property {
                if source.is_none() {
                    source = fields
                        .get(property)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty());
                    if let Some(row_scenario) = &source
                        && !options.is_selected(row_scenario)
                    {
                        prepared.filtered_rows += 1;
                        continue;
                    }
                }
                if let Some(source) = &source {
                    fields.insert(property.to_string(), options.renamed(source).to_string());
                }
            }
            let target = source.as_deref().map(|s| options.renamed(s).to_string());

            let (record, warnings, errors) = validate_row(schema, row, fields);
            let tag = |issue: ImportIssue| issue.in_scenario(target.as_deref());
            prepared.warnings.extend(warnings.into_iter().map(tag));

            let group = prepared.group(kind_name, target.as_deref());
            if let Some(source) = &source {
                group.source_scenarios.insert(source.clone());
            }
            let Some(record) = record else {
                group.rejected_rows += 1;
                prepared.errors.extend(errors.into_iter().map(tag));
                if options.stop_on_first_error {
                    prepared.aborted = true;
                    return prepared;
                }
                continue;
            };
            if let Some(previous) = group.records.insert(record.key.clone(), record) {
                group.duplicate_rows += 1;
                prepared.warnings.push(
                    ImportIssue::warning(format!(
                        "duplicate key {} in batch; the later row wins",
                        previous.key
                    ))
                    .in_kind(kind_name)
                    .in_scenario(target.as_deref())
                    .at_row(row.line),
                );
            }
        }
    }

    prepared
}

fn clean(value: &str, options: &ImportOptions) -> String {
    if options.trim_whitespace {
        value.trim().to_string()
    } else {
        value.to_string()
    }
}

/// Validates one row. Returns the record when the row has no errors.
fn validate_row(
    schema: &DataTypeSchema,
    row: &ParsedRow,
    fields: BTreeMap<String, String>,
) -> (Option<Record>, Vec<ImportIssue>, Vec<ImportIssue>) {
    let kind = schema.name();
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let mut components = Vec::with_capacity(schema.kind().arity());
    for property in schema.kind().key_properties() {
        match fields.get(property).filter(|v| !v.trim().is_empty()) {
            Some(value) => components.push(value.clone()),
            None => errors.push(
                ImportIssue::error(format!("missing key component {property}"))
                    .in_kind(kind)
                    .at_row(row.line)
                    .for_property(property.as_str()),
            ),
        }
    }

    for property in schema.catalog().required_properties() {
        if schema.kind().key_properties().contains(&property.name) {
            continue;
        }
        let empty = fields
            .get(&property.name)
            .is_none_or(|v| v.trim().is_empty());
        if empty {
            errors.push(
                ImportIssue::error(format!("required property {} is empty", property.name))
                    .in_kind(kind)
                    .at_row(row.line)
                    .for_property(property.name.as_str()),
            );
        }
    }

    for (name, value) in &fields {
        let Some(property) = schema.catalog().get(name) else {
            continue;
        };
        if !property.value_kind.accepts(value) {
            warnings.push(
                ImportIssue::warning(format!(
                    "'{value}' is not a valid {} for {}",
                    property.value_kind, property.name
                ))
                .in_kind(kind)
                .at_row(row.line)
                .for_property(property.name.as_str()),
            );
        }
    }

    if !errors.is_empty() {
        return (None, warnings, errors);
    }
    match CompositeKey::new(components) {
        Ok(key) => (Some(Record { key, fields }), warnings, errors),
        Err(error) => {
            errors.push(
                ImportIssue::error(error.to_string())
                    .in_kind(kind)
                    .at_row(row.line),
            );
            (None, warnings, errors)
        }
    }
}

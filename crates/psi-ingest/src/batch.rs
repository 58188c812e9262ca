//! Parsed import batches.
//!
//! A batch holds the rows of one or more record kinds, split into
//! sub-batches by scenario. Rows carry property values keyed by property
//! name; keys are built during validation.

use std::collections::BTreeMap;

use psi_model::{AssociationSet, DataTypeSchema, RecordKind};

use crate::csv_table::CsvTable;
use crate::error::{IngestError, Result};

/// One source row: its 1-based line and property values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRow {
    pub line: usize,
    pub fields: BTreeMap<String, String>,
}

impl ParsedRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(property.into(), value.into());
        self
    }

    pub fn field(&self, property: &str) -> Option<&str> {
        self.fields.get(property).map(String::as_str)
    }
}

/// Rows of one kind sharing a scenario. `scenario` is `None` for
/// non-scenario kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBatch {
    pub kind: String,
    pub scenario: Option<String>,
    pub rows: Vec<ParsedRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    pub sub_batches: Vec<SubBatch>,
}

impl ImportBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits rows of one kind by the value of its scenario property.
    ///
    /// Scenario values are trimmed for grouping. Rows with no scenario value
    /// land in a sub-batch without a scenario and fail key validation later.
    pub fn from_rows(kind: &RecordKind, rows: Vec<ParsedRow>) -> Self {
        let Some(scenario_property) = kind.scenario_property() else {
            return Self {
                sub_batches: vec![SubBatch {
                    kind: kind.name().to_string(),
                    scenario: None,
                    rows,
                }],
            };
        };

        let mut groups: BTreeMap<Option<String>, Vec<ParsedRow>> = BTreeMap::new();
        for row in rows {
            let scenario = row
                .field(scenario_property)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            groups.entry(scenario).or_default().push(row);
        }
        Self {
            sub_batches: groups
                .into_iter()
                .map(|(scenario, rows)| SubBatch {
                    kind: kind.name().to_string(),
                    scenario,
                    rows,
                })
                .collect(),
        }
    }

    pub fn push(&mut self, sub_batch: SubBatch) {
        self.sub_batches.push(sub_batch);
    }

    pub fn extend(&mut self, other: ImportBatch) {
        self.sub_batches.extend(other.sub_batches);
    }

    pub fn row_count(&self) -> usize {
        self.sub_batches.iter().map(|s| s.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Builds a batch for one data type from a table through its associations.
///
/// Every key property must be mapped to a column present in the table.
/// Associations whose column is absent are ignored for non-key properties.
pub fn batch_from_table(
    table: &CsvTable,
    associations: &AssociationSet,
    schema: &DataTypeSchema,
) -> Result<ImportBatch> {
    let kind = schema.kind();
    for property in kind.key_properties() {
        let association = associations
            .find_property(kind.name(), property)
            .ok_or_else(|| IngestError::UnmappedKey {
                kind: kind.name().to_string(),
                property: property.clone(),
            })?;
        if !table.has_column(&association.column_header) {
            return Err(IngestError::MissingColumn {
                kind: kind.name().to_string(),
                property: property.clone(),
                column: association.column_header.clone(),
            });
        }
    }

    let columns: Vec<(String, usize)> = associations
        .for_data_type(kind.name())
        .filter_map(|a| {
            let index = table.column_index(&a.column_header)?;
            let property = schema.catalog().get(&a.property_name)?;
            Some((property.name.clone(), index))
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| ParsedRow {
            line: row.line,
            fields: columns
                .iter()
                .map(|(property, index)| (property.clone(), table.value(row, *index).to_string()))
                .collect(),
        })
        .collect();

    Ok(ImportBatch::from_rows(kind, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_split_by_trimmed_scenario() {
        let kind = RecordKind::scenario("ArcFlash", ["Id", "Scenario"], 1).unwrap();
        let rows = vec![
            ParsedRow::new(2).with_field("Id", "B1").with_field("Scenario", "Main-Max"),
            ParsedRow::new(3).with_field("Id", "B1").with_field("Scenario", " Main-Min "),
            ParsedRow::new(4).with_field("Id", "B2").with_field("Scenario", "Main-Max"),
            ParsedRow::new(5).with_field("Id", "B3"),
        ];
        let batch = ImportBatch::from_rows(&kind, rows);
        let summary: Vec<_> = batch
            .sub_batches
            .iter()
            .map(|s| (s.scenario.as_deref(), s.rows.len()))
            .collect();
        assert_eq!(summary, [(None, 1), (Some("Main-Max"), 2), (Some("Main-Min"), 1)]);
        assert_eq!(batch.row_count(), 4);
    }

    #[test]
    fn non_scenario_kinds_form_one_sub_batch() {
        let kind = RecordKind::single("Bus", "Name").unwrap();
        let batch = ImportBatch::from_rows(&kind, vec![ParsedRow::new(2), ParsedRow::new(3)]);
        assert_eq!(batch.sub_batches.len(), 1);
        assert!(batch.sub_batches[0].scenario.is_none());
    }
}

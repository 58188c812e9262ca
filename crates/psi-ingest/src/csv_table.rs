use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use psi_map::ColumnScanner;
use psi_map::utils::header_key;
use psi_model::SourceColumn;

use crate::discovery::Workbook;

/// One data row and the 1-based line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Index of a header, ignoring case and surrounding whitespace.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        let wanted = header_key(header);
        self.headers.iter().position(|h| header_key(h) == wanted)
    }

    pub fn has_column(&self, header: &str) -> bool {
        self.column_index(header).is_some()
    }

    /// Value of `header` in `row`, empty when the row is short.
    pub fn value<'a>(&self, row: &'a CsvRow, index: usize) -> &'a str {
        row.values.get(index).map_or("", String::as_str)
    }
}

/// Strips a byte-order mark and collapses inner whitespace.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim_matches('\u{feff}').trim();
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reads a CSV file whose first record is the header row.
///
/// Cell values are kept verbatim; trimming is an import option.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header: {}", path.display()))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        let line = record
            .position()
            .map_or(rows.len() + 2, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));
        let values = (0..headers.len())
            .map(|idx| record.get(idx).unwrap_or("").to_string())
            .collect();
        rows.push(CsvRow { line, values });
    }
    tracing::debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "read csv table"
    );
    Ok(CsvTable { headers, rows })
}

/// Reads only the header row.
pub fn read_csv_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;
    Ok(reader
        .headers()
        .with_context(|| format!("read header: {}", path.display()))?
        .iter()
        .map(normalize_header)
        .filter(|h| !h.is_empty())
        .collect())
}

/// Source columns of a table with their non-empty sample counts.
pub fn source_columns(table: &CsvTable, table_name: &str) -> Vec<SourceColumn> {
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !header.is_empty())
        .map(|(idx, header)| {
            let non_empty = table
                .rows
                .iter()
                .filter(|row| !table.value(row, idx).trim().is_empty())
                .count();
            SourceColumn::new(table_name, header.as_str()).with_sample_count(non_empty)
        })
        .collect()
}

/// Scans CSV files for their headers. A directory is treated as one
/// workbook whose sheets are the CSV files inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvColumnScanner;

impl ColumnScanner for CsvColumnScanner {
    fn scan_columns(&self, file_id: &str) -> Result<Vec<String>> {
        let workbook = Workbook::open(Path::new(file_id))?;
        let mut headers = BTreeSet::new();
        for sheet in &workbook.sheets {
            headers.extend(read_csv_headers(sheet)?);
        }
        Ok(headers.into_iter().collect())
    }
}

//! Source columns extracted from imported files.

use serde::{Deserialize, Serialize};

/// A column header found in a source table.
///
/// Identity is `(source_table, name)`; the sample count is informational and
/// does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceColumn {
    /// Header text as it appears in the file.
    pub name: String,
    /// Table or sheet the column was read from.
    pub source_table: String,
    /// Number of non-empty cells seen while sampling the column.
    #[serde(default)]
    pub sample_non_empty_count: usize,
}

impl SourceColumn {
    pub fn new(source_table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_table: source_table.into(),
            sample_non_empty_count: 0,
        }
    }

    #[must_use]
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_non_empty_count = count;
        self
    }

    /// The identity tuple of this column.
    pub fn id(&self) -> (&str, &str) {
        (&self.source_table, &self.name)
    }
}

impl PartialEq for SourceColumn {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for SourceColumn {}

impl std::hash::Hash for SourceColumn {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

//! Detection of associations orphaned by removing a source file.
//!
//! Header matching is exact apart from case and surrounding whitespace. No
//! fuzzy matching is used here: a false positive would delete a valid
//! mapping.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use psi_model::{AssociationSet, ColumnPropertyAssociation};

use crate::utils::header_key;

/// Lists the column headers a source file contributes.
pub trait ColumnScanner {
    /// Headers across every table or sheet of `file_id`.
    fn scan_columns(&self, file_id: &str) -> anyhow::Result<Vec<String>>;
}

/// Associations that would dangle if a file were removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrphanReport {
    pub file_id: String,
    pub orphaned: Vec<ColumnPropertyAssociation>,
    /// The file could not be scanned and was treated as contributing no
    /// columns.
    pub scan_failed: bool,
}

impl OrphanReport {
    /// Orphaned associations grouped by data type.
    pub fn grouped(&self) -> BTreeMap<String, Vec<ColumnPropertyAssociation>> {
        let mut groups: BTreeMap<String, Vec<ColumnPropertyAssociation>> = BTreeMap::new();
        for association in &self.orphaned {
            groups
                .entry(association.target_data_type.clone())
                .or_default()
                .push(association.clone());
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.orphaned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphaned.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrphanDetector {
    retained: BTreeSet<String>,
}

impl OrphanDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers still contributed by files that stay in the project. They are
    /// never reported as orphaned.
    #[must_use]
    pub fn retaining<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.retained
            .extend(columns.into_iter().map(|c| header_key(c.as_ref())));
        self
    }

    /// Scans `file_id` and reports the associations that depend on it.
    ///
    /// An unreadable file is logged and treated as contributing no columns.
    pub fn detect(
        &self,
        associations: &AssociationSet,
        file_id: &str,
        scanner: &dyn ColumnScanner,
    ) -> OrphanReport {
        match scanner.scan_columns(file_id) {
            Ok(columns) => self.detect_in_columns(associations, file_id, &columns),
            Err(error) => {
                warn!(
                    file = file_id,
                    error = %error,
                    "could not read columns of file slated for removal"
                );
                OrphanReport {
                    file_id: file_id.to_string(),
                    orphaned: Vec::new(),
                    scan_failed: true,
                }
            }
        }
    }

    /// Reports associations whose header is among `columns`.
    pub fn detect_in_columns<S: AsRef<str>>(
        &self,
        associations: &AssociationSet,
        file_id: &str,
        columns: &[S],
    ) -> OrphanReport {
        let removed: BTreeSet<String> = columns
            .iter()
            .map(|c| header_key(c.as_ref()))
            .filter(|c| !c.is_empty() && !self.retained.contains(c))
            .collect();

        let orphaned: Vec<_> = associations
            .iter()
            .filter(|a| removed.contains(&header_key(&a.column_header)))
            .cloned()
            .collect();

        debug!(
            file = file_id,
            columns = removed.len(),
            orphaned = orphaned.len(),
            "orphan scan"
        );
        OrphanReport {
            file_id: file_id.to_string(),
            orphaned,
            scan_failed: false,
        }
    }
}

/// Removes exactly the confirmed associations that are still present with the
/// same column header. Returns the number removed.
pub fn commit_removal(
    associations: &mut AssociationSet,
    confirmed: &[ColumnPropertyAssociation],
) -> usize {
    let mut removed = 0;
    for association in confirmed {
        let current = associations.get(&association.target_data_type, &association.property_name);
        if current.is_some_and(|c| c.column_header == association.column_header) {
            associations.remove(&association.target_data_type, &association.property_name);
            removed += 1;
        }
    }
    removed
}

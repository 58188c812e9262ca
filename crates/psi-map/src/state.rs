//! Mapping document state.
//!
//! A mapping document owns the column-to-property associations of one
//! project, plus the low-confidence suggestions of the last auto-map run.
//! Suggestions are session-only and are not persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use psi_model::{
    AssociationKey, AssociationOrigin, AssociationSet, ColumnPropertyAssociation,
    PropertyCatalog, Replaced, TargetProperty,
};

use crate::error::MappingError;
use crate::orphan::commit_removal;

/// A low-confidence candidate awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSuggestion {
    pub column: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingDocument {
    pub project: String,
    #[serde(default)]
    associations: AssociationSet,
    /// Last time an association was set or cleared.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    suggestions: BTreeMap<AssociationKey, PendingSuggestion>,
}

/// Status of one property in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyStatus {
    Mapped(AssociationOrigin),
    Suggested,
    Unmapped,
}

/// Summary of mapping counts for one data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingSummary {
    pub total_properties: usize,
    pub mapped: usize,
    pub suggested: usize,
    pub required_total: usize,
    pub required_mapped: usize,
}

impl MappingSummary {
    pub fn is_complete(&self) -> bool {
        self.required_mapped == self.required_total
    }
}

impl MappingDocument {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    pub fn associations(&self) -> &AssociationSet {
        &self.associations
    }

    /// Removes confirmed associations whose column is unchanged, returning
    /// how many were removed.
    pub fn remove_associations(&mut self, confirmed: &[ColumnPropertyAssociation]) -> usize {
        let removed = commit_removal(&mut self.associations, confirmed);
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Sets an association, returning what it replaced.
    pub fn set_association(&mut self, association: ColumnPropertyAssociation) -> Replaced {
        self.suggestions.remove(&association.key());
        let replaced = self.associations.replace(association);
        if replaced != Replaced::Unchanged {
            self.touch();
        }
        replaced
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Maps `property` to `column` as a user-confirmed association.
    pub fn accept_manual(
        &mut self,
        catalog: &PropertyCatalog,
        property: &str,
        column: &str,
    ) -> Result<Replaced, MappingError> {
        let target = find_property(catalog, property)?;
        let column = column.trim();
        if column.is_empty() {
            return Err(MappingError::EmptyColumn {
                data_type: catalog.data_type().to_string(),
                property: target.name.clone(),
            });
        }
        let association = ColumnPropertyAssociation::new(
            catalog.data_type(),
            &target.name,
            column,
            target.required,
        )
        .manual();
        Ok(self.set_association(association))
    }

    /// Confirms the pending suggestion for a property.
    pub fn accept_suggestion(
        &mut self,
        catalog: &PropertyCatalog,
        property: &str,
    ) -> Result<Replaced, MappingError> {
        let target = find_property(catalog, property)?;
        let key = AssociationKey::new(catalog.data_type(), &target.name);
        let Some(suggestion) = self.suggestions.get(&key).cloned() else {
            return Err(MappingError::NoSuggestion {
                data_type: catalog.data_type().to_string(),
                property: target.name.clone(),
            });
        };
        self.accept_manual(catalog, &target.name, &suggestion.column)
    }

    /// Removes the association for a property.
    pub fn clear_mapping(
        &mut self,
        data_type: &str,
        property: &str,
    ) -> Option<ColumnPropertyAssociation> {
        let removed = self.associations.remove(data_type, property);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn suggestion(&self, data_type: &str, property: &str) -> Option<&PendingSuggestion> {
        self.suggestions.get(&AssociationKey::new(data_type, property))
    }

    pub(crate) fn record_suggestion(
        &mut self,
        data_type: &str,
        property: &str,
        column: &str,
        score: f64,
    ) {
        self.suggestions.insert(
            AssociationKey::new(data_type, property),
            PendingSuggestion {
                column: column.to_string(),
                score,
            },
        );
    }

    pub(crate) fn forget_suggestion(&mut self, data_type: &str, property: &str) {
        self.suggestions.remove(&AssociationKey::new(data_type, property));
    }

    pub fn status(&self, data_type: &str, property: &str) -> PropertyStatus {
        if let Some(association) = self.associations.get(data_type, property) {
            PropertyStatus::Mapped(association.origin)
        } else if self.suggestion(data_type, property).is_some() {
            PropertyStatus::Suggested
        } else {
            PropertyStatus::Unmapped
        }
    }

    /// Required properties of the catalog that have no association.
    pub fn missing_required<'a>(&self, catalog: &'a PropertyCatalog) -> Vec<&'a TargetProperty> {
        catalog
            .required_properties()
            .filter(|p| !self.associations.contains(catalog.data_type(), &p.name))
            .collect()
    }

    pub fn summary(&self, catalog: &PropertyCatalog) -> MappingSummary {
        let data_type = catalog.data_type();
        let mut summary = MappingSummary {
            total_properties: catalog.len(),
            mapped: 0,
            suggested: 0,
            required_total: 0,
            required_mapped: 0,
        };
        for property in catalog.properties() {
            let status = self.status(data_type, &property.name);
            let mapped = matches!(status, PropertyStatus::Mapped(_));
            summary.mapped += usize::from(mapped);
            summary.suggested += usize::from(status == PropertyStatus::Suggested);
            if property.required {
                summary.required_total += 1;
                summary.required_mapped += usize::from(mapped);
            }
        }
        summary
    }
}

fn find_property<'a>(
    catalog: &'a PropertyCatalog,
    property: &str,
) -> Result<&'a TargetProperty, MappingError> {
    catalog
        .get(property)
        .ok_or_else(|| MappingError::PropertyNotFound {
            data_type: catalog.data_type().to_string(),
            property: property.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use psi_model::builtin_registry;

    fn bus_catalog() -> PropertyCatalog {
        builtin_registry()
            .unwrap()
            .require("Bus")
            .unwrap()
            .catalog()
            .clone()
    }

    #[test]
    fn manual_mapping_uses_catalog_name_and_required_flag() {
        let catalog = bus_catalog();
        let mut doc = MappingDocument::new("Plant A");
        assert!(doc.updated_at.is_none());
        doc.accept_manual(&catalog, "name", " Bus ID ").unwrap();
        assert!(doc.updated_at.is_some());

        let association = doc.associations().get("Bus", "Name").unwrap();
        assert_eq!(association.column_header, "Bus ID");
        assert!(association.required);
        assert!(association.is_manual());
        assert_eq!(
            doc.status("Bus", "Name"),
            PropertyStatus::Mapped(AssociationOrigin::Manual)
        );
    }

    #[test]
    fn removing_associations_skips_changed_columns() {
        let mut doc = MappingDocument::new("Plant A");
        doc.set_association(ColumnPropertyAssociation::new("Bus", "Name", "Bus ID", true));
        doc.set_association(ColumnPropertyAssociation::new("Bus", "Voltage", "kV", false));
        doc.updated_at = None;

        let stale = [
            ColumnPropertyAssociation::new("Bus", "Name", "Old Bus ID", true),
            ColumnPropertyAssociation::new("Bus", "Voltage", "kV", false),
        ];
        assert_eq!(doc.remove_associations(&stale), 1);
        assert!(doc.updated_at.is_some());
        assert!(doc.associations().get("Bus", "Name").is_some());
        assert!(doc.associations().get("Bus", "Voltage").is_none());

        doc.updated_at = None;
        assert_eq!(doc.remove_associations(&stale), 0);
        assert!(doc.updated_at.is_none());
    }

    #[test]
    fn unknown_property_and_empty_column_are_rejected() {
        let catalog = bus_catalog();
        let mut doc = MappingDocument::new("Plant A");
        assert!(matches!(
            doc.accept_manual(&catalog, "Impedance", "Z"),
            Err(MappingError::PropertyNotFound { .. })
        ));
        assert!(matches!(
            doc.accept_manual(&catalog, "Name", "  "),
            Err(MappingError::EmptyColumn { .. })
        ));
    }

    #[test]
    fn summary_counts_required_properties() {
        let catalog = bus_catalog();
        let mut doc = MappingDocument::new("Plant A");
        doc.accept_manual(&catalog, "Name", "BusName").unwrap();
        doc.record_suggestion("Bus", "NominalVoltage", "kV", 0.5);

        let summary = doc.summary(&catalog);
        assert_eq!(summary.total_properties, 4);
        assert_eq!(summary.mapped, 1);
        assert_eq!(summary.suggested, 1);
        assert_eq!(summary.required_total, 2);
        assert_eq!(summary.required_mapped, 1);
        assert!(!summary.is_complete());
        assert_eq!(doc.missing_required(&catalog)[0].name, "NominalVoltage");
    }

    #[test]
    fn accepting_a_suggestion_confirms_it() {
        let catalog = bus_catalog();
        let mut doc = MappingDocument::new("Plant A");
        assert!(doc.accept_suggestion(&catalog, "NominalVoltage").is_err());

        doc.record_suggestion("Bus", "NominalVoltage", "kV", 0.5);
        doc.accept_suggestion(&catalog, "NominalVoltage").unwrap();
        assert_eq!(
            doc.associations()
                .get("Bus", "NominalVoltage")
                .map(|a| a.column_header.as_str()),
            Some("kV")
        );
        assert!(doc.suggestion("Bus", "NominalVoltage").is_none());
    }

    #[test]
    fn clearing_returns_the_removed_association() {
        let catalog = bus_catalog();
        let mut doc = MappingDocument::new("Plant A");
        doc.accept_manual(&catalog, "Name", "BusName").unwrap();
        assert!(doc.clear_mapping("Bus", "Name").is_some());
        assert_eq!(doc.status("Bus", "Name"), PropertyStatus::Unmapped);
    }
}

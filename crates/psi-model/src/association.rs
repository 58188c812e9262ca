//! Column-to-property associations.
//!
//! An association links one source column header to one target property of a
//! data type. The set is keyed by `(data type, property)`: at most one column
//! feeds any property.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Severity of an association or an import issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// How an association came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationOrigin {
    /// Accepted automatically by the auto-mapping policy.
    #[default]
    Auto,
    /// Set or confirmed by a user.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPropertyAssociation {
    pub target_data_type: String,
    pub property_name: String,
    pub column_header: String,
    pub required: bool,
    pub severity: Severity,
    #[serde(default)]
    pub origin: AssociationOrigin,
}

impl ColumnPropertyAssociation {
    /// Creates an association with severity derived from `required`.
    pub fn new(
        target_data_type: impl Into<String>,
        property_name: impl Into<String>,
        column_header: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            target_data_type: target_data_type.into(),
            property_name: property_name.into(),
            column_header: column_header.into(),
            required,
            severity: if required {
                Severity::Error
            } else {
                Severity::Warning
            },
            origin: AssociationOrigin::Auto,
        }
    }

    #[must_use]
    pub fn manual(mut self) -> Self {
        self.origin = AssociationOrigin::Manual;
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_manual(&self) -> bool {
        self.origin == AssociationOrigin::Manual
    }

    pub fn key(&self) -> AssociationKey {
        AssociationKey::new(&self.target_data_type, &self.property_name)
    }
}

/// `(data type, property)` identity of an association.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssociationKey {
    pub data_type: String,
    pub property: String,
}

impl AssociationKey {
    pub fn new(data_type: &str, property: &str) -> Self {
        Self {
            data_type: data_type.to_string(),
            property: property.to_string(),
        }
    }
}

/// Outcome of [`AssociationSet::replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replaced {
    /// No association existed for the key.
    Inserted,
    /// An identical association already existed.
    Unchanged,
    /// A different association was overwritten.
    Previous(ColumnPropertyAssociation),
}

impl Replaced {
    pub fn previous(&self) -> Option<&ColumnPropertyAssociation> {
        match self {
            Self::Previous(previous) => Some(previous),
            _ => None,
        }
    }
}

/// The associations owned by one mapping document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnPropertyAssociation>", into = "Vec<ColumnPropertyAssociation>")]
pub struct AssociationSet {
    entries: BTreeMap<AssociationKey, ColumnPropertyAssociation>,
}

impl AssociationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the association for its key, reporting what was there before.
    pub fn replace(&mut self, association: ColumnPropertyAssociation) -> Replaced {
        match self.entries.insert(association.key(), association.clone()) {
            None => Replaced::Inserted,
            Some(previous) if previous == association => Replaced::Unchanged,
            Some(previous) => Replaced::Previous(previous),
        }
    }

    pub fn get(&self, data_type: &str, property: &str) -> Option<&ColumnPropertyAssociation> {
        self.entries.get(&AssociationKey::new(data_type, property))
    }

    pub fn contains(&self, data_type: &str, property: &str) -> bool {
        self.get(data_type, property).is_some()
    }

    pub fn remove(&mut self, data_type: &str, property: &str) -> Option<ColumnPropertyAssociation> {
        self.entries.remove(&AssociationKey::new(data_type, property))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnPropertyAssociation> {
        self.entries.values()
    }

    /// Associations targeting one data type, in property-name order.
    pub fn for_data_type<'a>(
        &'a self,
        data_type: &'a str,
    ) -> impl Iterator<Item = &'a ColumnPropertyAssociation> + 'a {
        self.entries
            .values()
            .filter(move |a| a.target_data_type == data_type)
    }

    /// Finds the association for a property ignoring the case of its name.
    pub fn find_property<'a>(
        &'a self,
        data_type: &'a str,
        property: &'a str,
    ) -> Option<&'a ColumnPropertyAssociation> {
        self.for_data_type(data_type)
            .find(move |a| a.property_name.eq_ignore_ascii_case(property))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<ColumnPropertyAssociation>> for AssociationSet {
    fn from(value: Vec<ColumnPropertyAssociation>) -> Self {
        let mut set = Self::new();
        for association in value {
            set.replace(association);
        }
        set
    }
}

impl From<AssociationSet> for Vec<ColumnPropertyAssociation> {
    fn from(set: AssociationSet) -> Self {
        set.entries.into_values().collect()
    }
}

impl FromIterator<ColumnPropertyAssociation> for AssociationSet {
    fn from_iter<T: IntoIterator<Item = ColumnPropertyAssociation>>(iter: T) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

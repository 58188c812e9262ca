//! Declared target property catalogs.
//!
//! Each data type publishes a fixed, versioned list of properties that source
//! columns can be mapped onto. Catalogs are plain data: they are built once per
//! schema version and never discovered at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Expected shape of a property's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Text,
    Number,
    Integer,
    Boolean,
}

impl ValueKind {
    /// Returns true if `raw` is a well-formed value of this kind.
    ///
    /// Empty values are accepted; emptiness is checked separately.
    pub fn accepts(self, raw: &str) -> bool {
        let value = raw.trim();
        if value.is_empty() {
            return true;
        }
        match self {
            Self::Text => true,
            Self::Number => value.parse::<f64>().is_ok_and(f64::is_finite),
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Boolean => matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "yes" | "no" | "y" | "n" | "1" | "0"
            ),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

/// A canonical property that source columns are matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProperty {
    pub name: String,
    pub data_type_name: String,
    pub description: Option<String>,
    pub required: bool,
    #[serde(default)]
    pub value_kind: ValueKind,
}

impl TargetProperty {
    pub fn new(data_type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type_name: data_type_name.into(),
            description: None,
            required: false,
            value_kind: ValueKind::Text,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.value_kind = kind;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The property list of one data type at one schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCatalog {
    data_type: String,
    schema_version: u32,
    properties: Vec<TargetProperty>,
}

impl PropertyCatalog {
    /// Builds a catalog, rejecting empty or duplicate (case-insensitive) names
    /// and properties declared for another data type.
    pub fn new(
        data_type: impl Into<String>,
        schema_version: u32,
        properties: Vec<TargetProperty>,
    ) -> Result<Self> {
        let data_type = data_type.into();
        if data_type.trim().is_empty() {
            return Err(ModelError::EmptyName { what: "data type" });
        }
        let mut seen = std::collections::BTreeSet::new();
        for property in &properties {
            if property.name.trim().is_empty() {
                return Err(ModelError::EmptyName {
                    what: "property name",
                });
            }
            if property.data_type_name != data_type {
                return Err(ModelError::ForeignProperty {
                    data_type: data_type.clone(),
                    property: property.name.clone(),
                    found: property.data_type_name.clone(),
                });
            }
            if !seen.insert(property.name.to_lowercase()) {
                return Err(ModelError::DuplicateProperty {
                    data_type: data_type.clone(),
                    property: property.name.clone(),
                });
            }
        }
        Ok(Self {
            data_type,
            schema_version,
            properties,
        })
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn properties(&self) -> &[TargetProperty] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks a property up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&TargetProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn required_properties(&self) -> impl Iterator<Item = &TargetProperty> {
        self.properties.iter().filter(|p| p.required)
    }
}

#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Ordered tuple of string components identifying one record within its kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    pub fn new<I, S>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        if components.is_empty() {
            return Err(ModelError::EmptyKey);
        }
        if let Some(index) = components.iter().position(|c| c.trim().is_empty()) {
            return Err(ModelError::EmptyKeyComponent { index });
        }
        Ok(Self(components))
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    pub fn component(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy of this key with one component replaced.
    pub fn with_component(&self, index: usize, value: impl Into<String>) -> Result<Self> {
        let mut components = self.0.clone();
        let arity = components.len();
        let slot = components
            .get_mut(index)
            .ok_or(ModelError::ComponentOutOfRange { index, arity })?;
        *slot = value.into();
        Self::new(components)
    }
}

impl TryFrom<Vec<String>> for CompositeKey {
    type Error = ModelError;

    fn try_from(value: Vec<String>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CompositeKey> for Vec<String> {
    fn from(key: CompositeKey) -> Self {
        key.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

/// Key layout of one record kind.
///
/// `key_properties` names the property supplying each key component, so the
/// arity of every key in the kind is `key_properties.len()`. Scenario-bearing
/// kinds carry the scenario name at `scenario_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecordKind")]
pub struct RecordKind {
    name: String,
    key_properties: Vec<String>,
    scenario_index: Option<usize>,
}

#[derive(Deserialize)]
struct StoredRecordKind {
    name: String,
    key_properties: Vec<String>,
    scenario_index: Option<usize>,
}

impl TryFrom<StoredRecordKind> for RecordKind {
    type Error = ModelError;

    fn try_from(stored: StoredRecordKind) -> Result<Self> {
        Self::build(stored.name, stored.key_properties, stored.scenario_index)
    }
}

impl RecordKind {
    /// A kind keyed by a single identifier property.
    pub fn single(name: impl Into<String>, id_property: impl Into<String>) -> Result<Self> {
        Self::build(name.into(), vec![id_property.into()], None)
    }

    /// A kind whose key includes a scenario component.
    pub fn scenario<I, S>(
        name: impl Into<String>,
        key_properties: I,
        scenario_index: usize,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key_properties = key_properties.into_iter().map(Into::into).collect();
        Self::build(name.into(), key_properties, Some(scenario_index))
    }

    fn build(
        name: String,
        key_properties: Vec<String>,
        scenario_index: Option<usize>,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ModelError::EmptyName { what: "record kind" });
        }
        if key_properties.is_empty() {
            return Err(ModelError::EmptyKey);
        }
        if key_properties.iter().any(|p| p.trim().is_empty()) {
            return Err(ModelError::EmptyName {
                what: "key property",
            });
        }
        if let Some(index) = scenario_index
            && index >= key_properties.len()
        {
            return Err(ModelError::ScenarioIndexOutOfRange {
                kind: name,
                index,
                arity: key_properties.len(),
            });
        }
        Ok(Self {
            name,
            key_properties,
            scenario_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_properties(&self) -> &[String] {
        &self.key_properties
    }

    pub fn arity(&self) -> usize {
        self.key_properties.len()
    }

    pub fn scenario_index(&self) -> Option<usize> {
        self.scenario_index
    }

    pub fn has_scenarios(&self) -> bool {
        self.scenario_index.is_some()
    }

    /// Name of the property holding the scenario, if any.
    pub fn scenario_property(&self) -> Option<&str> {
        self.scenario_index
            .and_then(|i| self.key_properties.get(i))
            .map(String::as_str)
    }

    /// Extracts the scenario component from a key of this kind.
    pub fn scenario_of<'a>(&self, key: &'a CompositeKey) -> Option<&'a str> {
        self.scenario_index.and_then(|i| key.component(i))
    }

    /// Checks that `key` has the arity of this kind.
    pub fn check_key(&self, key: &CompositeKey) -> Result<()> {
        if key.len() == self.arity() {
            Ok(())
        } else {
            Err(ModelError::ArityMismatch {
                kind: self.name.clone(),
                expected: self.arity(),
                found: key.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_rejects_blank_components() {
        assert_eq!(
            CompositeKey::new(["BUS-1", " "]).unwrap_err(),
            ModelError::EmptyKeyComponent { index: 1 }
        );
        assert_eq!(
            CompositeKey::new(Vec::<String>::new()).unwrap_err(),
            ModelError::EmptyKey
        );
    }

    #[test]
    fn with_component_replaces_in_place() {
        let key = CompositeKey::new(["BUS-1", "CB-2", "Main-Max"]).unwrap();
        let renamed = key.with_component(2, "Base").unwrap();
        assert_eq!(renamed.components(), ["BUS-1", "CB-2", "Base"]);
        assert!(key.with_component(3, "x").is_err());
    }

    #[test]
    fn scenario_index_must_fit_key() {
        let err = RecordKind::scenario("ArcFlash", ["Id", "Scenario"], 2).unwrap_err();
        assert!(matches!(err, ModelError::ScenarioIndexOutOfRange { .. }));
    }

    #[test]
    fn scenario_component_is_read_from_fixed_index() {
        let kind = RecordKind::scenario("ShortCircuit", ["BusId", "EquipmentId", "Scenario"], 2)
            .unwrap();
        let key = CompositeKey::new(["BUS-1", "CB-2", "Main-Min"]).unwrap();
        assert_eq!(kind.scenario_of(&key), Some("Main-Min"));
        assert_eq!(kind.scenario_property(), Some("Scenario"));
    }

    #[test]
    fn key_serializes_as_array() {
        let key = CompositeKey::new(["A", "B"]).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["A","B"]"#);
        assert!(serde_json::from_str::<CompositeKey>(r#"["A",""]"#).is_err());
    }

    #[test]
    fn stored_kind_layout_is_validated() {
        let json = r#"{"name":"ArcFlash","key_properties":["Id"],"scenario_index":3}"#;
        assert!(serde_json::from_str::<RecordKind>(json).is_err());
        let json = r#"{"name":"ArcFlash","key_properties":["Id","Scenario"],"scenario_index":1}"#;
        let kind: RecordKind = serde_json::from_str(json).unwrap();
        assert_eq!(kind.scenario_property(), Some("Scenario"));
    }
}

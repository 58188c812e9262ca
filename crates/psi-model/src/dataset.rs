//! Composite-key dataset.
//!
//! A dataset holds one keyed store per record kind. Scenario-bearing kinds
//! carry the scenario name inside each key, so a single store holds every
//! scenario of a study side by side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::key::{CompositeKey, RecordKind};
use crate::schema::SchemaRegistry;

/// One imported record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: CompositeKey,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new(key: CompositeKey) -> Self {
        Self {
            key,
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredKind", into = "StoredKind")]
struct KindStore {
    kind: RecordKind,
    records: BTreeMap<CompositeKey, Record>,
}

/// On-disk shape of a kind store: the map key is already inside each record.
#[derive(Serialize, Deserialize)]
struct StoredKind {
    kind: RecordKind,
    records: Vec<Record>,
}

impl TryFrom<StoredKind> for KindStore {
    type Error = ModelError;

    fn try_from(stored: StoredKind) -> Result<Self> {
        let mut records = BTreeMap::new();
        for record in stored.records {
            stored.kind.check_key(&record.key)?;
            records.insert(record.key.clone(), record);
        }
        Ok(Self {
            kind: stored.kind,
            records,
        })
    }
}

impl From<KindStore> for StoredKind {
    fn from(store: KindStore) -> Self {
        Self {
            kind: store.kind,
            records: store.records.into_values().collect(),
        }
    }
}

/// Records of every kind owned by one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredDataset")]
pub struct Dataset {
    kinds: BTreeMap<String, KindStore>,
}

#[derive(Deserialize)]
struct StoredDataset {
    kinds: BTreeMap<String, KindStore>,
}

impl TryFrom<StoredDataset> for Dataset {
    type Error = ModelError;

    fn try_from(stored: StoredDataset) -> Result<Self> {
        for (key, store) in &stored.kinds {
            if key != store.kind.name() {
                return Err(ModelError::KindNameMismatch {
                    key: key.clone(),
                    kind: store.kind.name().to_string(),
                });
            }
        }
        Ok(Self {
            kinds: stored.kinds,
        })
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty dataset with every kind of the registry registered.
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let mut dataset = Self::new();
        for schema in registry.iter() {
            dataset.kinds.insert(
                schema.name().to_string(),
                KindStore {
                    kind: schema.kind().clone(),
                    records: BTreeMap::new(),
                },
            );
        }
        dataset
    }

    /// Registers a kind. Re-registering the same layout is a no-op.
    pub fn register_kind(&mut self, kind: RecordKind) -> Result<()> {
        if let Some(existing) = self.kinds.get(kind.name()) {
            if existing.kind == kind {
                return Ok(());
            }
            return Err(ModelError::KindConflict {
                kind: kind.name().to_string(),
            });
        }
        self.kinds.insert(
            kind.name().to_string(),
            KindStore {
                kind,
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Checks every stored kind against `registry` and registers the
    /// registry kinds that are missing.
    ///
    /// A stored kind unknown to the registry, or stored with a different key
    /// layout, is an error.
    pub fn conform_to(&mut self, registry: &SchemaRegistry) -> Result<()> {
        for store in self.kinds.values() {
            let schema = registry
                .get(store.kind.name())
                .filter(|schema| schema.name() == store.kind.name())
                .ok_or_else(|| ModelError::UnknownKind(store.kind.name().to_string()))?;
            if schema.kind() != &store.kind {
                return Err(ModelError::KindConflict {
                    kind: store.kind.name().to_string(),
                });
            }
        }
        for schema in registry.iter() {
            self.register_kind(schema.kind().clone())?;
        }
        Ok(())
    }

    pub fn kind(&self, name: &str) -> Option<&RecordKind> {
        self.kinds.get(name).map(|store| &store.kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &RecordKind> {
        self.kinds.values().map(|store| &store.kind)
    }

    /// Inserts a record, returning the record previously stored under its key.
    pub fn insert(&mut self, kind: &str, record: Record) -> Result<Option<Record>> {
        let store = self
            .kinds
            .get_mut(kind)
            .ok_or_else(|| ModelError::UnknownKind(kind.to_string()))?;
        store.kind.check_key(&record.key)?;
        Ok(store.records.insert(record.key.clone(), record))
    }

    pub fn get(&self, kind: &str, key: &CompositeKey) -> Option<&Record> {
        self.kinds.get(kind)?.records.get(key)
    }

    pub fn contains_key(&self, kind: &str, key: &CompositeKey) -> bool {
        self.get(kind, key).is_some()
    }

    pub fn remove(&mut self, kind: &str, key: &CompositeKey) -> Option<Record> {
        self.kinds.get_mut(kind)?.records.remove(key)
    }

    /// Removes every record of `kind` whose scenario component equals
    /// `scenario`. Returns the number removed; non-scenario kinds are untouched.
    pub fn remove_scenario(&mut self, kind: &str, scenario: &str) -> usize {
        let Some(store) = self.kinds.get_mut(kind) else {
            return 0;
        };
        let Some(index) = store.kind.scenario_index() else {
            return 0;
        };
        let before = store.records.len();
        store
            .records
            .retain(|key, _| key.component(index) != Some(scenario));
        before - store.records.len()
    }

    /// Removes all records of one kind, keeping the kind registered.
    pub fn clear_kind(&mut self, kind: &str) -> usize {
        self.kinds.get_mut(kind).map_or(0, |store| {
            let count = store.records.len();
            store.records.clear();
            count
        })
    }

    /// Removes all records of every kind.
    pub fn clear(&mut self) {
        for store in self.kinds.values_mut() {
            store.records.clear();
        }
    }

    pub fn records<'a>(&'a self, kind: &str) -> impl Iterator<Item = &'a Record> + 'a {
        self.kinds
            .get(kind)
            .into_iter()
            .flat_map(|store| store.records.values())
    }

    pub fn kind_len(&self, kind: &str) -> usize {
        self.kinds.get(kind).map_or(0, |store| store.records.len())
    }

    pub fn len(&self) -> usize {
        self.kinds.values().map(|store| store.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records of `kind` in `scenario`.
    pub fn scenario_count(&self, kind: &str, scenario: &str) -> usize {
        let Some(store) = self.kinds.get(kind) else {
            return 0;
        };
        let Some(index) = store.kind.scenario_index() else {
            return 0;
        };
        store
            .records
            .keys()
            .filter(|key| key.component(index) == Some(scenario))
            .count()
    }

    pub(crate) fn stores(
        &self,
    ) -> impl Iterator<Item = (&RecordKind, &BTreeMap<CompositeKey, Record>)> {
        self.kinds.values().map(|store| (&store.kind, &store.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc_flash() -> RecordKind {
        RecordKind::scenario("ArcFlash", ["Id", "Scenario"], 1).unwrap()
    }

    fn key(parts: &[&str]) -> CompositeKey {
        CompositeKey::new(parts.iter().copied()).unwrap()
    }

    #[test]
    fn insert_checks_kind_and_arity() {
        let mut dataset = Dataset::new();
        dataset.register_kind(arc_flash()).unwrap();

        let err = dataset
            .insert("ArcFlash", Record::new(key(&["SWGR-1"])))
            .unwrap_err();
        assert!(matches!(err, ModelError::ArityMismatch { expected: 2, found: 1, .. }));

        let err = dataset
            .insert("Bus", Record::new(key(&["B1"])))
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownKind("Bus".to_string()));
    }

    #[test]
    fn insert_returns_previous_record() {
        let mut dataset = Dataset::new();
        dataset.register_kind(arc_flash()).unwrap();
        let k = key(&["SWGR-1", "Main-Max"]);
        let first = Record::new(k.clone()).with_field("IncidentEnergy", "4.2");
        assert!(dataset.insert("ArcFlash", first.clone()).unwrap().is_none());
        let previous = dataset
            .insert("ArcFlash", Record::new(k).with_field("IncidentEnergy", "5.0"))
            .unwrap();
        assert_eq!(previous, Some(first));
        assert_eq!(dataset.kind_len("ArcFlash"), 1);
    }

    #[test]
    fn remove_scenario_only_touches_that_scenario() {
        let mut dataset = Dataset::new();
        dataset.register_kind(arc_flash()).unwrap();
        for scenario in ["Main-Max", "Main-Min"] {
            for id in ["A", "B", "C"] {
                dataset
                    .insert("ArcFlash", Record::new(key(&[id, scenario])))
                    .unwrap();
            }
        }
        assert_eq!(dataset.remove_scenario("ArcFlash", "Main-Max"), 3);
        assert_eq!(dataset.scenario_count("ArcFlash", "Main-Max"), 0);
        assert_eq!(dataset.scenario_count("ArcFlash", "Main-Min"), 3);
    }

    #[test]
    fn stored_keys_must_match_the_kind_arity() {
        let json = r#"{"kinds":{"ArcFlash":{
            "kind":{"name":"ArcFlash","key_properties":["Id","Scenario"],"scenario_index":1},
            "records":[
                {"key":["SWGR-1"],"fields":{}},
                {"key":["SWGR-2","Main-Max","extra"],"fields":{}}
            ]}}}"#;
        let err = serde_json::from_str::<Dataset>(json).unwrap_err();
        assert!(err.to_string().contains("expects 2 key components"), "{err}");
    }

    #[test]
    fn stored_kind_must_match_its_map_key() {
        let json = r#"{"kinds":{"LVCB":{
            "kind":{"name":"ArcFlash","key_properties":["Id","Scenario"],"scenario_index":1},
            "records":[]}}}"#;
        let err = serde_json::from_str::<Dataset>(json).unwrap_err();
        assert!(err.to_string().contains("stored under 'LVCB'"), "{err}");
    }

    #[test]
    fn saved_dataset_loads_back() {
        let mut dataset = Dataset::new();
        dataset.register_kind(arc_flash()).unwrap();
        dataset
            .insert("ArcFlash", Record::new(key(&["SWGR-1", "Main-Max"])))
            .unwrap();
        let json = serde_json::to_string(&dataset).unwrap();
        let loaded: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn conform_to_rejects_kinds_outside_the_registry() {
        let registry = crate::schema::builtin_registry().unwrap();
        let mut dataset = Dataset::new();
        dataset.register_kind(arc_flash()).unwrap();
        dataset.conform_to(&registry).unwrap();
        assert!(dataset.kind("Bus").is_some());

        let mut foreign = Dataset::new();
        foreign
            .register_kind(RecordKind::single("Relay", "Id").unwrap())
            .unwrap();
        assert_eq!(
            foreign.conform_to(&registry),
            Err(ModelError::UnknownKind("Relay".to_string()))
        );

        let mut reshaped = Dataset::new();
        reshaped
            .register_kind(RecordKind::single("ArcFlash", "Id").unwrap())
            .unwrap();
        assert!(matches!(
            reshaped.conform_to(&registry),
            Err(ModelError::KindConflict { .. })
        ));
    }

    #[test]
    fn conflicting_layouts_are_rejected() {
        let mut dataset = Dataset::new();
        dataset.register_kind(arc_flash()).unwrap();
        dataset.register_kind(arc_flash()).unwrap();
        let other = RecordKind::single("ArcFlash", "Id").unwrap();
        assert!(dataset.register_kind(other).is_err());
    }
}

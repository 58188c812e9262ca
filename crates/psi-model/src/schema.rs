//! Data type schemas and the registry passed into mapping and import calls.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{PropertyCatalog, TargetProperty, ValueKind};
use crate::error::{ModelError, Result};
use crate::key::RecordKind;

/// Key layout and property catalog of one data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypeSchema {
    kind: RecordKind,
    catalog: PropertyCatalog,
}

impl DataTypeSchema {
    /// Pairs a kind with its catalog. Every key property must be declared in
    /// the catalog.
    pub fn new(kind: RecordKind, catalog: PropertyCatalog) -> Result<Self> {
        if kind.name() != catalog.data_type() {
            return Err(ModelError::KindConflict {
                kind: kind.name().to_string(),
            });
        }
        for property in kind.key_properties() {
            if catalog.get(property).is_none() {
                return Err(ModelError::UnknownProperty {
                    data_type: catalog.data_type().to_string(),
                    property: property.clone(),
                });
            }
        }
        Ok(Self { kind, catalog })
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn kind(&self) -> &RecordKind {
        &self.kind
    }

    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }
}

/// All data types known to a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, DataTypeSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: DataTypeSchema) -> Option<DataTypeSchema> {
        self.schemas.insert(schema.name().to_string(), schema)
    }

    #[must_use]
    pub fn with(mut self, schema: DataTypeSchema) -> Self {
        self.register(schema);
        self
    }

    /// Looks a schema up by name, falling back to a case-insensitive match.
    pub fn get(&self, name: &str) -> Option<&DataTypeSchema> {
        self.schemas.get(name).or_else(|| {
            self.schemas
                .values()
                .find(|s| s.name().eq_ignore_ascii_case(name))
        })
    }

    pub fn require(&self, name: &str) -> Result<&DataTypeSchema> {
        self.get(name)
            .ok_or_else(|| ModelError::UnknownKind(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataTypeSchema> {
        self.schemas.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Which data types and properties a project shows.
///
/// Hidden properties are never auto-mapped; hidden kinds are left out of
/// statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityConfig {
    #[serde(default)]
    pub hidden_kinds: BTreeSet<String>,
    #[serde(default)]
    pub hidden_properties: BTreeMap<String, BTreeSet<String>>,
}

impl VisibilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hide_kind(mut self, kind: impl Into<String>) -> Self {
        self.hidden_kinds.insert(kind.into());
        self
    }

    #[must_use]
    pub fn hide_property(mut self, kind: impl Into<String>, property: impl Into<String>) -> Self {
        self.hidden_properties
            .entry(kind.into())
            .or_default()
            .insert(property.into());
        self
    }

    pub fn is_kind_visible(&self, kind: &str) -> bool {
        !self.hidden_kinds.contains(kind)
    }

    pub fn is_property_visible(&self, kind: &str, property: &str) -> bool {
        self.is_kind_visible(kind)
            && !self
                .hidden_properties
                .get(kind)
                .is_some_and(|hidden| hidden.contains(property))
    }
}

/// Schema version of the built-in catalogs.
pub const BUILTIN_SCHEMA_VERSION: u32 = 1;

/// The standard equipment and study data types.
pub fn builtin_registry() -> Result<SchemaRegistry> {
    Ok(SchemaRegistry::new()
        .with(bus()?)
        .with(lvcb()?)
        .with(arc_flash()?)
        .with(short_circuit()?))
}

fn catalog(data_type: &str, properties: Vec<TargetProperty>) -> Result<PropertyCatalog> {
    PropertyCatalog::new(data_type, BUILTIN_SCHEMA_VERSION, properties)
}

fn bus() -> Result<DataTypeSchema> {
    let p = |name| TargetProperty::new("Bus", name);
    DataTypeSchema::new(
        RecordKind::single("Bus", "Name")?,
        catalog(
            "Bus",
            vec![
                p("Name").required().with_description("Bus identifier"),
                p("NominalVoltage")
                    .required()
                    .with_kind(ValueKind::Number)
                    .with_description("Nominal voltage in kV"),
                p("Description"),
                p("InService").with_kind(ValueKind::Boolean),
            ],
        )?,
    )
}

fn lvcb() -> Result<DataTypeSchema> {
    let p = |name| TargetProperty::new("LVCB", name);
    DataTypeSchema::new(
        RecordKind::single("LVCB", "Id")?,
        catalog(
            "LVCB",
            vec![
                p("Id").required().with_description("Breaker identifier"),
                p("Bus"),
                p("Manufacturer"),
                p("Style"),
                p("TripUnit"),
                p("FrameSize").with_kind(ValueKind::Number),
                p("TripRating").with_kind(ValueKind::Number),
            ],
        )?,
    )
}

fn arc_flash() -> Result<DataTypeSchema> {
    let p = |name| TargetProperty::new("ArcFlash", name);
    DataTypeSchema::new(
        RecordKind::scenario("ArcFlash", ["Id", "Scenario"], 1)?,
        catalog(
            "ArcFlash",
            vec![
                p("Id").required(),
                p("Scenario").required(),
                p("Bus"),
                p("IncidentEnergy")
                    .required()
                    .with_kind(ValueKind::Number)
                    .with_description("Incident energy in cal/cm2"),
                p("ArcFlashBoundary").with_kind(ValueKind::Number),
                p("WorkingDistance").with_kind(ValueKind::Number),
                p("ArcingCurrent").with_kind(ValueKind::Number),
                p("TripTime").with_kind(ValueKind::Number),
                p("PPECategory").with_kind(ValueKind::Integer),
            ],
        )?,
    )
}

fn short_circuit() -> Result<DataTypeSchema> {
    let p = |name| TargetProperty::new("ShortCircuit", name);
    DataTypeSchema::new(
        RecordKind::scenario("ShortCircuit", ["BusId", "EquipmentId", "Scenario"], 2)?,
        catalog(
            "ShortCircuit",
            vec![
                p("BusId").required(),
                p("EquipmentId").required(),
                p("Scenario").required(),
                p("FaultCurrent")
                    .required()
                    .with_kind(ValueKind::Number)
                    .with_description("Available fault current in kA"),
                p("InterruptingRating").with_kind(ValueKind::Number),
                p("DutyPercent").with_kind(ValueKind::Number),
            ],
        )?,
    )
}

pub mod association;
pub mod catalog;
pub mod column;
pub mod dataset;
pub mod error;
pub mod issue;
pub mod key;
pub mod options;
pub mod schema;
pub mod statistics;

pub use association::{
    AssociationKey, AssociationOrigin, AssociationSet, ColumnPropertyAssociation, Replaced,
    Severity,
};
pub use catalog::{PropertyCatalog, TargetProperty, ValueKind};
pub use column::SourceColumn;
pub use dataset::{Dataset, Record};
pub use error::{ModelError, Result};
pub use issue::ImportIssue;
pub use key::{CompositeKey, RecordKind};
pub use options::{ImportOptions, MergeStrategy};
pub use schema::{
    BUILTIN_SCHEMA_VERSION, DataTypeSchema, SchemaRegistry, VisibilityConfig, builtin_registry,
};
pub use statistics::{ALL_SCENARIOS_LABEL, ScenarioStatistics, case_collisions};

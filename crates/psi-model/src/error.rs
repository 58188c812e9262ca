use thiserror::Error;

/// Errors raised when a model contract is violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    #[error("{what} must not be empty")]
    EmptyName { what: &'static str },

    #[error("composite key must have at least one component")]
    EmptyKey,

    #[error("composite key component {index} is empty")]
    EmptyKeyComponent { index: usize },

    #[error("record kind '{kind}' expects {expected} key components, got {found}")]
    ArityMismatch {
        kind: String,
        expected: usize,
        found: usize,
    },

    #[error("key component {index} is out of range for a {arity}-component key")]
    ComponentOutOfRange { index: usize, arity: usize },

    #[error("record kind '{0}' is not registered")]
    UnknownKind(String),

    #[error("record kind stored under '{key}' is named '{kind}'")]
    KindNameMismatch { key: String, kind: String },

    #[error("record kind '{kind}' is already registered with a different key layout")]
    KindConflict { kind: String },

    #[error("scenario index {index} is out of range for a {arity}-component key in '{kind}'")]
    ScenarioIndexOutOfRange {
        kind: String,
        index: usize,
        arity: usize,
    },

    #[error("duplicate property '{property}' in catalog '{data_type}'")]
    DuplicateProperty { data_type: String, property: String },

    #[error("property '{property}' does not exist in catalog '{data_type}'")]
    UnknownProperty { data_type: String, property: String },

    #[error("property '{property}' belongs to '{found}', not catalog '{data_type}'")]
    ForeignProperty {
        data_type: String,
        property: String,
        found: String,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;

//! Error types for matching and mapping operations.

use thiserror::Error;

/// Invalid inputs to the matching functions.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MatchError {
    /// Prefix scale outside `[0, 0.25]`.
    #[error("prefix scale {0} is outside [0, 0.25]")]
    InvalidPrefixScale(f64),

    /// A similarity floor or threshold outside `[0, 1]`.
    #[error("threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    /// Confidence thresholds out of order.
    #[error(
        "thresholds must satisfy 0 <= suggest floor ({suggest_floor}) \
         <= auto-accept ({auto_accept}) <= 1"
    )]
    InvalidThresholds {
        /// Requested auto-accept threshold.
        auto_accept: f64,
        /// Requested suggestion floor.
        suggest_floor: f64,
    },
}

/// Errors from mapping document operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MappingError {
    /// Property not found in the data type's catalog.
    #[error("Property not found: {data_type}.{property}")]
    PropertyNotFound {
        /// Data type searched.
        data_type: String,
        /// Requested property.
        property: String,
    },

    /// Catalog belongs to a different data type than requested.
    #[error("Catalog for '{found}' cannot map '{data_type}'")]
    CatalogMismatch {
        /// Requested data type.
        data_type: String,
        /// Data type of the supplied catalog.
        found: String,
    },

    /// Column header is empty.
    #[error("Column header for {data_type}.{property} is empty")]
    EmptyColumn {
        /// Data type of the association.
        data_type: String,
        /// Property of the association.
        property: String,
    },

    /// No suggestion exists for the property.
    #[error("No suggestion for {data_type}.{property}")]
    NoSuggestion {
        /// Data type of the property.
        data_type: String,
        /// Property without a suggestion.
        property: String,
    },
}

impl MappingError {
    /// Get the property name associated with this error, if any.
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::PropertyNotFound { property, .. }
            | Self::EmptyColumn { property, .. }
            | Self::NoSuggestion { property, .. } => Some(property),
            Self::CatalogMismatch { .. } => None,
        }
    }
}

//! Error types for building import batches.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised before any row is validated.
///
/// Row-level problems are never errors; they are reported as
/// [`psi_model::ImportIssue`]s.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A key property of the data type has no association.
    #[error("key property {kind}.{property} is not mapped to a column")]
    UnmappedKey { kind: String, property: String },

    /// An association points at a column the table does not have.
    #[error("column '{column}' mapped to {kind}.{property} is not in the table")]
    MissingColumn {
        kind: String,
        property: String,
        column: String,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;

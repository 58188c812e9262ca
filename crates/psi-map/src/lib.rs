//! Column-to-property mapping for imported study data.
//!
//! - [`distance`]: edit distance and Jaro-Winkler primitives
//! - [`fuzzy`]: tiered classification of a header against a property name
//! - [`engine`]: the auto-mapping policy with confidence bands
//! - [`state`]: the mapping document owning associations
//! - [`orphan`]: associations left dangling by removing a file
//! - [`repository`]: JSON persistence of mapping documents

pub mod distance;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod orphan;
pub mod repository;
pub mod state;
pub mod utils;

pub use distance::{
    edit_distance, edit_similarity, jaro_similarity, prefix_weighted_similarity,
    prefix_weighted_similarity_with_scale,
};
pub use engine::{
    AutoMapOptions, AutoMapSummary, AutoMapThresholds, AutoMapper, Candidate, ConfidenceBand,
    PropertyProposal,
};
pub use error::{MappingError, MatchError};
pub use fuzzy::{FuzzyMatcher, MatchMode, MatchReason, MatchResult};
pub use orphan::{ColumnScanner, OrphanDetector, OrphanReport, commit_removal};
pub use repository::{
    MappingMetadata, MappingRepository, StoredMappingDocument, load_document, save_document,
};
pub use state::{MappingDocument, MappingSummary, PendingSuggestion, PropertyStatus};

//! Mapping repository for persisting and reusing mapping documents.
//!
//! Documents are stored as JSON files named `{PROJECT}.json`, so the same
//! column-to-property associations can be reused across imports.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::MappingDocument;

const FORMAT_VERSION: &str = "1.0";

/// Directory-backed store of mapping documents.
#[derive(Debug, Clone)]
pub struct MappingRepository {
    base_dir: PathBuf,
}

/// Metadata about a stored mapping document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingMetadata {
    pub project: String,
    pub file_path: PathBuf,
    pub association_count: usize,
    pub saved_at: Option<DateTime<Utc>>,
}

/// A mapping document with repository metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMappingDocument {
    #[serde(flatten)]
    pub document: MappingDocument,
    pub saved_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl StoredMappingDocument {
    pub fn new(document: MappingDocument) -> Self {
        Self {
            document,
            saved_at: Some(Utc::now()),
            description: None,
            version: default_version(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl MappingRepository {
    /// Opens a repository, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!(
                "Failed to create mapping repository: {}",
                base_dir.display()
            )
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn save(&self, document: &MappingDocument) -> Result<PathBuf> {
        self.save_stored(&StoredMappingDocument::new(document.clone()))
    }

    pub fn save_stored(&self, stored: &StoredMappingDocument) -> Result<PathBuf> {
        let path = self.path_for(&stored.document.project);
        let json = serde_json::to_string_pretty(stored).with_context(|| {
            format!("Failed to serialize mapping for {}", stored.document.project)
        })?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write mapping to {}", path.display()))?;
        Ok(path)
    }

    /// Loads the document of a project; `None` if it was never saved.
    pub fn load(&self, project: &str) -> Result<Option<MappingDocument>> {
        Ok(self.load_stored(project)?.map(|stored| stored.document))
    }

    pub fn load_stored(&self, project: &str) -> Result<Option<StoredMappingDocument>> {
        let path = self.path_for(project);
        if !path.exists() {
            return Ok(None);
        }
        read_stored(&path).map(Some)
    }

    /// Lists every readable document, sorted by project.
    pub fn list(&self) -> Result<Vec<MappingMetadata>> {
        let mut metadata = Vec::new();
        for entry in fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read repository: {}", self.base_dir.display()))?
        {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_stored(&path) {
                Ok(stored) => metadata.push(MappingMetadata {
                    project: stored.document.project.clone(),
                    association_count: stored.document.associations().len(),
                    saved_at: stored.saved_at,
                    file_path: path,
                }),
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %error,
                        "skipping unreadable mapping"
                    );
                }
            }
        }
        metadata.sort_by(|a, b| a.project.cmp(&b.project));
        Ok(metadata)
    }

    pub fn delete(&self, project: &str) -> Result<bool> {
        let path = self.path_for(project);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete mapping: {}", path.display()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn exists(&self, project: &str) -> bool {
        self.path_for(project).exists()
    }

    fn path_for(&self, project: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_id(project)))
    }
}

fn read_stored(path: &Path) -> Result<StoredMappingDocument> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse mapping from {}", path.display()))
}

/// Normalize an ID for use in filenames.
fn normalize_id(id: &str) -> String {
    id.trim()
        .to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Loads a document from an explicit file path.
pub fn load_document(path: &Path) -> Result<MappingDocument> {
    read_stored(path).map(|stored| stored.document)
}

/// Writes a document to an explicit file path.
pub fn save_document(path: &Path, document: &MappingDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(&StoredMappingDocument::new(document.clone()))
        .context("Failed to serialize mapping")?;
    fs::write(path, json).with_context(|| format!("Failed to write mapping to {}", path.display()))
}

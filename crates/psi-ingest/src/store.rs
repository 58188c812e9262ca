//! Dataset persistence as JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use psi_model::{Dataset, SchemaRegistry};

/// Loads a dataset, or starts an empty one for `registry` when the file
/// does not exist yet.
///
/// Stored kinds must match the registry; keys are checked against their
/// kind while parsing.
pub fn load_dataset(path: &Path, registry: &SchemaRegistry) -> Result<Dataset> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "dataset file not found; starting empty");
        return Ok(Dataset::from_registry(registry));
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset from {}", path.display()))?;
    let mut dataset: Dataset = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse dataset from {}", path.display()))?;
    dataset
        .conform_to(registry)
        .with_context(|| format!("Dataset {} does not match the data types", path.display()))?;
    Ok(dataset)
}

pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(dataset).context("Failed to serialize dataset")?;
    fs::write(path, json).with_context(|| format!("Failed to write dataset to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use psi_model::builtin_registry;

    #[test]
    fn rejects_keys_with_the_wrong_arity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        fs::write(
            &path,
            r#"{"kinds":{"ArcFlash":{
                "kind":{"name":"ArcFlash","key_properties":["Id","Scenario"],"scenario_index":1},
                "records":[{"key":["SWGR-1"],"fields":{}}]}}}"#,
        )
        .unwrap();
        let registry = builtin_registry().unwrap();
        let err = load_dataset(&path, &registry).unwrap_err();
        assert!(format!("{err:#}").contains("expects 2 key components"), "{err:#}");
    }

    #[test]
    fn rejects_kinds_with_a_different_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        fs::write(
            &path,
            r#"{"kinds":{"ArcFlash":{
                "kind":{"name":"ArcFlash","key_properties":["Id"],"scenario_index":null},
                "records":[{"key":["SWGR-1"],"fields":{}}]}}}"#,
        )
        .unwrap();
        let registry = builtin_registry().unwrap();
        let err = load_dataset(&path, &registry).unwrap_err();
        assert!(format!("{err:#}").contains("different key layout"), "{err:#}");
    }

    #[test]
    fn missing_kinds_are_registered_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dataset.json");
        let registry = builtin_registry().unwrap();
        save_dataset(&path, &Dataset::new()).unwrap();
        let dataset = load_dataset(&path, &registry).unwrap();
        assert!(dataset.kind("ShortCircuit").is_some());
    }
}

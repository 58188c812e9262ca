//! Configuration options for one import call.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// How incoming records combine with existing records of the same scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Drop existing records of the scenario, then insert everything.
    Replace,
    /// Leave a scenario alone if it already has records.
    SkipExisting,
    /// Add new keys only; existing records are never overwritten.
    #[default]
    Merge,
}

impl MergeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::SkipExisting => "skip-existing",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one import or audit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Discard rows whose mapped fields are all empty.
    pub skip_blank_rows: bool,

    /// Trim surrounding whitespace from every value.
    pub trim_whitespace: bool,

    /// Abort on the first row-level error instead of collecting them all.
    pub stop_on_first_error: bool,

    /// Scenario renames applied before merging (source name -> target name).
    #[serde(default)]
    pub scenario_renames: Option<BTreeMap<String, String>>,

    /// Only these scenarios (by source name) are imported when non-empty.
    #[serde(default)]
    pub selected_scenarios: Option<BTreeSet<String>>,

    pub merge_strategy: MergeStrategy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_blank_rows: true,
            trim_whitespace: true,
            stop_on_first_error: false,
            scenario_renames: None,
            selected_scenarios: None,
            merge_strategy: MergeStrategy::default(),
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.scenario_renames
            .get_or_insert_with(BTreeMap::new)
            .insert(from.into(), to.into());
        self
    }

    #[must_use]
    pub fn with_selected<I, S>(mut self, scenarios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_scenarios
            .get_or_insert_with(BTreeSet::new)
            .extend(scenarios.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn stop_on_first_error(mut self, enable: bool) -> Self {
        self.stop_on_first_error = enable;
        self
    }

    #[must_use]
    pub fn skip_blank_rows(mut self, enable: bool) -> Self {
        self.skip_blank_rows = enable;
        self
    }

    #[must_use]
    pub fn trim_whitespace(mut self, enable: bool) -> Self {
        self.trim_whitespace = enable;
        self
    }

    /// True if `scenario` passes the selection filter.
    pub fn is_selected(&self, scenario: &str) -> bool {
        match &self.selected_scenarios {
            Some(selected) if !selected.is_empty() => selected.contains(scenario),
            _ => true,
        }
    }

    /// The name a scenario is stored under after renames.
    pub fn renamed<'a>(&'a self, scenario: &'a str) -> &'a str {
        self.scenario_renames
            .as_ref()
            .and_then(|renames| renames.get(scenario))
            .map_or(scenario, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_selects_everything() {
        let options = ImportOptions::new();
        assert!(options.is_selected("Main-Max"));
        let options = ImportOptions {
            selected_scenarios: Some(BTreeSet::new()),
            ..ImportOptions::default()
        };
        assert!(options.is_selected("Main-Max"));
        let options = ImportOptions::new().with_selected(["Main-Min"]);
        assert!(!options.is_selected("Main-Max"));
    }

    #[test]
    fn renames_fall_back_to_original() {
        let options = ImportOptions::new().with_rename("MAX", "Main-Max");
        assert_eq!(options.renamed("MAX"), "Main-Max");
        assert_eq!(options.renamed("MIN"), "MIN");
    }
}

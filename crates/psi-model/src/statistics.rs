//! Scenario discovery and per-scenario record counts.
//!
//! Scenario identity is the exact string stored in the key: "Main-Max" and
//! "main-max" are two scenarios. [`Dataset::scenario_case_collisions`] lets
//! callers flag names that differ only by case.

use std::collections::{BTreeMap, BTreeSet};

use crate::dataset::Dataset;
use crate::schema::VisibilityConfig;

/// Label used for kinds that are not partitioned by scenario.
pub const ALL_SCENARIOS_LABEL: &str = "(All)";

/// Record counts per kind, then per scenario label.
pub type ScenarioStatistics = BTreeMap<String, BTreeMap<String, usize>>;

impl Dataset {
    /// Every scenario name present in any scenario-bearing kind, sorted.
    pub fn scenarios(&self) -> BTreeSet<String> {
        let mut scenarios = BTreeSet::new();
        for (kind, records) in self.stores() {
            let Some(index) = kind.scenario_index() else {
                continue;
            };
            for key in records.keys() {
                if let Some(scenario) = key.component(index) {
                    scenarios.insert(scenario.to_string());
                }
            }
        }
        scenarios
    }

    /// Counts per kind and scenario. Non-scenario kinds report their total
    /// under [`ALL_SCENARIOS_LABEL`]; empty kinds are omitted.
    pub fn statistics_by_scenario(&self) -> ScenarioStatistics {
        self.statistics_by_scenario_with(&VisibilityConfig::default())
    }

    pub fn statistics_by_scenario_with(&self, visibility: &VisibilityConfig) -> ScenarioStatistics {
        let mut statistics = ScenarioStatistics::new();
        for (kind, records) in self.stores() {
            if records.is_empty() || !visibility.is_kind_visible(kind.name()) {
                continue;
            }
            let counts = match kind.scenario_index() {
                Some(index) => {
                    let mut counts = BTreeMap::new();
                    for key in records.keys() {
                        if let Some(scenario) = key.component(index) {
                            *counts.entry(scenario.to_string()).or_insert(0) += 1;
                        }
                    }
                    counts
                }
                None => BTreeMap::from([(ALL_SCENARIOS_LABEL.to_string(), records.len())]),
            };
            statistics.insert(kind.name().to_string(), counts);
        }
        statistics
    }

    /// Counts per scenario-bearing kind for one scenario; kinds with no
    /// records in that scenario are omitted.
    pub fn statistics_for_scenario(&self, scenario: &str) -> BTreeMap<String, usize> {
        self.statistics_for_scenario_with(scenario, &VisibilityConfig::default())
    }

    pub fn statistics_for_scenario_with(
        &self,
        scenario: &str,
        visibility: &VisibilityConfig,
    ) -> BTreeMap<String, usize> {
        let mut statistics = BTreeMap::new();
        for (kind, records) in self.stores() {
            let Some(index) = kind.scenario_index() else {
                continue;
            };
            if !visibility.is_kind_visible(kind.name()) {
                continue;
            }
            let count = records
                .keys()
                .filter(|key| key.component(index) == Some(scenario))
                .count();
            if count > 0 {
                statistics.insert(kind.name().to_string(), count);
            }
        }
        statistics
    }

    /// True if `kind` has at most one scenario or every scenario has the same
    /// number of records. Unknown and empty kinds are uniform.
    pub fn is_uniform(&self, kind: &str) -> bool {
        let statistics = self.statistics_by_scenario();
        let Some(counts) = statistics.get(kind) else {
            return true;
        };
        let mut values = counts.values();
        match values.next() {
            Some(first) => values.all(|count| count == first),
            None => true,
        }
    }

    /// Groups of distinct scenario names that are equal ignoring case.
    pub fn scenario_case_collisions(&self) -> Vec<Vec<String>> {
        case_collisions(self.scenarios())
    }
}

/// Groups names that collide when compared case-insensitively.
pub fn case_collisions<I>(names: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for name in names {
        groups.entry(name.to_lowercase()).or_default().insert(name);
    }
    groups
        .into_values()
        .filter(|group| group.len() > 1)
        .map(|group| group.into_iter().collect())
        .collect()
}

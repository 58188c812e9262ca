//! Tiered fuzzy matching of column headers against property names.
//!
//! Tiers are tried most-specific-first and the first hit wins:
//!
//! | Tier | Reason | Score |
//! |------|--------|-------|
//! | exact | `Exact` | 1.00 |
//! | case-insensitive | `CaseInsensitive` | 0.98 |
//! | separators removed | `Normalized` | 0.96 |
//! | edit similarity ≥ floor | `EditDistance` | similarity |
//! | Jaro-Winkler ≥ floor | `PrefixSimilarity` | similarity |
//!
//! Hybrid mode keeps the three exact tiers and otherwise averages the two
//! algorithmic scores. Every tier is symmetric in its arguments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::distance::{edit_similarity, prefix_weighted_similarity};
use crate::error::MatchError;
use crate::utils::normalize_identifier;

pub const EXACT_SCORE: f64 = 1.0;
pub const CASE_INSENSITIVE_SCORE: f64 = 0.98;
pub const NORMALIZED_SCORE: f64 = 0.96;
/// Default minimum similarity for the algorithmic tiers.
pub const DEFAULT_SIMILARITY_FLOOR: f64 = 0.40;

/// Why a pair matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchReason {
    Exact,
    CaseInsensitive,
    Normalized,
    EditDistance,
    PrefixSimilarity,
    Hybrid,
    NoMatch,
}

impl MatchReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::CaseInsensitive => "Case-insensitive",
            Self::Normalized => "Normalized",
            Self::EditDistance => "Edit distance",
            Self::PrefixSimilarity => "Prefix similarity",
            Self::Hybrid => "Hybrid",
            Self::NoMatch => "No match",
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score of one (source, target) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Source column header as given.
    pub source: String,
    /// Target property name as given.
    pub target: String,
    /// Confidence in `0.0..=1.0`; zero when nothing matched.
    pub score: f64,
    pub reason: MatchReason,
}

impl MatchResult {
    fn new(source: &str, target: &str, score: f64, reason: MatchReason) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            score,
            reason,
        }
    }

    pub fn is_match(&self) -> bool {
        self.reason != MatchReason::NoMatch
    }

    /// Human-readable explanation of the score.
    pub fn explain(&self) -> String {
        format!("{}: {:.0}%", self.reason, self.score * 100.0)
    }
}

/// Which classification the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Stop at the first tier that reaches the floor.
    Tiered,
    /// Average edit and prefix similarity when no exact tier hits.
    #[default]
    Hybrid,
}

/// Scores header/property pairs through the tiers above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatcher {
    /// Minimum similarity for the algorithmic tiers to count as a match.
    floor: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            floor: DEFAULT_SIMILARITY_FLOOR,
        }
    }
}

impl FuzzyMatcher {
    /// Creates a matcher whose algorithmic tiers require `floor`.
    pub fn new(floor: f64) -> Result<Self, MatchError> {
        check_unit(floor)?;
        Ok(Self { floor })
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn classify_with(&self, mode: MatchMode, source: &str, target: &str) -> MatchResult {
        match mode {
            MatchMode::Tiered => self.classify(source, target),
            MatchMode::Hybrid => self.classify_hybrid(source, target),
        }
    }

    pub fn classify(&self, source: &str, target: &str) -> MatchResult {
        if let Some(result) = exact_tiers(source, target) {
            return result;
        }
        let edit = edit_similarity(source, target);
        if edit >= self.floor {
            return MatchResult::new(source, target, edit, MatchReason::EditDistance);
        }
        let prefix = prefix_weighted_similarity(source, target);
        if prefix >= self.floor {
            return MatchResult::new(source, target, prefix, MatchReason::PrefixSimilarity);
        }
        MatchResult::new(source, target, 0.0, MatchReason::NoMatch)
    }

    pub fn classify_hybrid(&self, source: &str, target: &str) -> MatchResult {
        if let Some(result) = exact_tiers(source, target) {
            return result;
        }
        let score =
            (edit_similarity(source, target) + prefix_weighted_similarity(source, target)) / 2.0;
        if score > 0.0 {
            MatchResult::new(source, target, score, MatchReason::Hybrid)
        } else {
            MatchResult::new(source, target, 0.0, MatchReason::NoMatch)
        }
    }

    /// True if `term` matches any of `fields` with a score of at least
    /// `threshold`. An empty term matches everything.
    pub fn matches_any<S: AsRef<str>>(
        &self,
        term: &str,
        fields: &[S],
        threshold: f64,
    ) -> Result<bool, MatchError> {
        check_unit(threshold)?;
        let term = term.trim();
        if term.is_empty() {
            return Ok(true);
        }
        Ok(fields
            .iter()
            .any(|field| self.classify(term, field.as_ref()).score >= threshold))
    }
}

fn exact_tiers(source: &str, target: &str) -> Option<MatchResult> {
    if source == target {
        return Some(MatchResult::new(source, target, EXACT_SCORE, MatchReason::Exact));
    }
    if source.to_lowercase() == target.to_lowercase() {
        return Some(MatchResult::new(
            source,
            target,
            CASE_INSENSITIVE_SCORE,
            MatchReason::CaseInsensitive,
        ));
    }
    let normalized = normalize_identifier(source);
    if !normalized.is_empty() && normalized == normalize_identifier(target) {
        return Some(MatchResult::new(
            source,
            target,
            NORMALIZED_SCORE,
            MatchReason::Normalized,
        ));
    }
    None
}

pub(crate) fn check_unit(value: f64) -> Result<(), MatchError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_in_order() {
        let m = FuzzyMatcher::default();
        assert_eq!(m.classify("Voltage", "Voltage").reason, MatchReason::Exact);
        let ci = m.classify("voltage", "Voltage");
        assert_eq!((ci.reason, ci.score), (MatchReason::CaseInsensitive, 0.98));
        let norm = m.classify("LV Breakers", "LVBreakers");
        assert_eq!((norm.reason, norm.score), (MatchReason::Normalized, 0.96));
        assert_eq!(m.classify("Voltge", "Voltage").reason, MatchReason::EditDistance);
        assert_eq!(m.classify("Voltage", "Zq").reason, MatchReason::NoMatch);
    }

    #[test]
    fn separator_only_headers_do_not_normalize_equal() {
        let m = FuzzyMatcher::default();
        assert_ne!(m.classify("__", "--").reason, MatchReason::Normalized);
    }

    #[test]
    fn hybrid_averages_algorithmic_scores() {
        let m = FuzzyMatcher::default();
        let result = m.classify_hybrid("IncEnergy", "IncidentEnergy");
        let expected = (edit_similarity("IncEnergy", "IncidentEnergy")
            + prefix_weighted_similarity("IncEnergy", "IncidentEnergy"))
            / 2.0;
        assert_eq!(result.reason, MatchReason::Hybrid);
        assert!((result.score - expected).abs() < 1e-12);
        assert_eq!(m.classify_hybrid("Id", "ID").reason, MatchReason::CaseInsensitive);
    }

    #[test]
    fn explanation_is_compact() {
        let m = FuzzyMatcher::default();
        let result = m.classify("LV Breakers", "LVBreakers");
        insta::assert_snapshot!(result.explain(), @"Normalized: 96%");
    }

    #[test]
    fn floor_is_validated() {
        assert!(FuzzyMatcher::new(1.5).is_err());
        assert!(FuzzyMatcher::new(-0.1).is_err());
        assert!(FuzzyMatcher::new(0.0).is_ok());
    }
}

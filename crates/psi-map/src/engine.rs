//! Auto-mapping policy.
//!
//! For every target property the engine finds the best-scoring source column
//! and sorts the result into a confidence band:
//!
//! - score ≥ auto-accept: an association is created automatically;
//! - suggest floor ≤ score < auto-accept: reported as a suggestion only;
//! - below the suggest floor: reported as unmatched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use psi_model::{
    ColumnPropertyAssociation, PropertyCatalog, Replaced, SourceColumn, TargetProperty,
    VisibilityConfig,
};

use crate::error::MatchError;
use crate::fuzzy::{FuzzyMatcher, MatchMode, MatchResult};
use crate::state::MappingDocument;

/// Confidence band of a best match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceBand {
    /// Below the suggest floor.
    NoMatch,
    /// Worth showing to a user, not applied.
    Suggest,
    /// Applied automatically.
    AutoAccept,
}

impl ConfidenceBand {
    /// Returns a human-readable description of the band.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::AutoAccept => "accepted automatically",
            Self::Suggest => "low confidence - needs confirmation",
            Self::NoMatch => "no usable match",
        }
    }
}

/// Thresholds separating the confidence bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoMapThresholds {
    auto_accept: f64,
    suggest_floor: f64,
}

impl Default for AutoMapThresholds {
    fn default() -> Self {
        Self {
            auto_accept: 0.60,
            suggest_floor: 0.40,
        }
    }
}

impl AutoMapThresholds {
    /// Validates `0 <= suggest_floor <= auto_accept <= 1`.
    pub fn new(auto_accept: f64, suggest_floor: f64) -> Result<Self, MatchError> {
        let ordered = (0.0..=1.0).contains(&suggest_floor)
            && (0.0..=1.0).contains(&auto_accept)
            && suggest_floor <= auto_accept;
        if !ordered {
            return Err(MatchError::InvalidThresholds {
                auto_accept,
                suggest_floor,
            });
        }
        Ok(Self {
            auto_accept,
            suggest_floor,
        })
    }

    pub fn auto_accept(&self) -> f64 {
        self.auto_accept
    }

    pub fn suggest_floor(&self) -> f64 {
        self.suggest_floor
    }

    #[must_use]
    pub fn categorize(&self, score: f64) -> ConfidenceBand {
        if score >= self.auto_accept {
            ConfidenceBand::AutoAccept
        } else if score >= self.suggest_floor {
            ConfidenceBand::Suggest
        } else {
            ConfidenceBand::NoMatch
        }
    }
}

/// Best column found for one property.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub column: SourceColumn,
    pub result: MatchResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyProposal {
    pub property: TargetProperty,
    pub best: Option<Candidate>,
    pub band: ConfidenceBand,
}

impl PropertyProposal {
    pub fn score(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |c| c.result.score)
    }

    pub fn column_name(&self) -> Option<&str> {
        self.best.as_ref().map(|c| c.column.name.as_str())
    }
}

/// Options for one auto-map run.
#[derive(Debug, Clone, Default)]
pub struct AutoMapOptions {
    /// Re-score properties that already have an association, including
    /// manually confirmed ones.
    pub reevaluate: bool,
    pub visibility: VisibilityConfig,
}

/// What an auto-map run did, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct AutoMapSummary {
    pub data_type: String,
    pub accepted: Vec<PropertyProposal>,
    pub suggested: Vec<PropertyProposal>,
    pub unmatched: Vec<PropertyProposal>,
    /// Properties left alone because they were already associated.
    pub skipped: Vec<String>,
    /// Associations overwritten by accepted matches.
    pub replaced: Vec<ColumnPropertyAssociation>,
}

/// Engine for mapping source columns onto a property catalog.
///
/// # Example
///
/// ```ignore
/// use psi_map::{AutoMapper, AutoMapOptions, MappingDocument};
///
/// let mut doc = MappingDocument::new("Plant A");
/// let options = AutoMapOptions::default();
/// let summary = AutoMapper::default().auto_map(&mut doc, &columns, &catalog, &options);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoMapper {
    thresholds: AutoMapThresholds,
    mode: MatchMode,
    matcher: FuzzyMatcher,
}

impl AutoMapper {
    pub fn new(thresholds: AutoMapThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: FuzzyMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn thresholds(&self) -> &AutoMapThresholds {
        &self.thresholds
    }

    /// Finds the best column for one property. Ties keep the earlier column.
    pub fn best_candidate(&self, property: &str, columns: &[SourceColumn]) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for column in columns {
            if column.name.trim().is_empty() {
                continue;
            }
            let result = self.matcher.classify_with(self.mode, &column.name, property);
            if !result.is_match() {
                continue;
            }
            let better = best
                .as_ref()
                .is_none_or(|current| result.score > current.result.score);
            if better {
                best = Some(Candidate {
                    column: column.clone(),
                    result,
                });
            }
        }
        best
    }

    /// Scores every visible property of the catalog without side effects.
    pub fn propose(
        &self,
        columns: &[SourceColumn],
        catalog: &PropertyCatalog,
        visibility: &VisibilityConfig,
    ) -> Vec<PropertyProposal> {
        catalog
            .properties()
            .iter()
            .filter(|p| visibility.is_property_visible(catalog.data_type(), &p.name))
            .map(|property| self.proposal(property, columns))
            .collect()
    }

    fn proposal(&self, property: &TargetProperty, columns: &[SourceColumn]) -> PropertyProposal {
        let best = self.best_candidate(&property.name, columns);
        let band = best
            .as_ref()
            .map_or(ConfidenceBand::NoMatch, |c| self.thresholds.categorize(c.result.score));
        PropertyProposal {
            property: property.clone(),
            best,
            band,
        }
    }

    /// Runs the policy against a document, creating associations for
    /// auto-accepted matches only.
    pub fn auto_map(
        &self,
        document: &mut MappingDocument,
        columns: &[SourceColumn],
        catalog: &PropertyCatalog,
        options: &AutoMapOptions,
    ) -> AutoMapSummary {
        let data_type = catalog.data_type();
        let mut summary = AutoMapSummary {
            data_type: data_type.to_string(),
            ..AutoMapSummary::default()
        };

        for property in catalog.properties() {
            if !options
                .visibility
                .is_property_visible(data_type, &property.name)
            {
                continue;
            }
            if !options.reevaluate && document.associations().contains(data_type, &property.name) {
                summary.skipped.push(property.name.clone());
                continue;
            }

            let proposal = self.proposal(property, columns);
            debug!(
                data_type,
                property = %property.name,
                column = proposal.column_name().unwrap_or("-"),
                score = proposal.score(),
                band = ?proposal.band,
                "auto-map proposal"
            );

            match (&proposal.best, proposal.band) {
                (Some(candidate), ConfidenceBand::AutoAccept) => {
                    let association = ColumnPropertyAssociation::new(
                        data_type,
                        &property.name,
                        &candidate.column.name,
                        property.required,
                    );
                    if let Replaced::Previous(previous) = document.set_association(association) {
                        summary.replaced.push(previous);
                    }
                    summary.accepted.push(proposal);
                }
                (Some(candidate), ConfidenceBand::Suggest) => {
                    document.record_suggestion(
                        data_type,
                        &property.name,
                        &candidate.column.name,
                        candidate.result.score,
                    );
                    summary.suggested.push(proposal);
                }
                _ => {
                    document.forget_suggestion(data_type, &property.name);
                    summary.unmatched.push(proposal);
                }
            }
        }

        info!(
            data_type,
            accepted = summary.accepted.len(),
            suggested = summary.suggested.len(),
            unmatched = summary.unmatched.len(),
            skipped = summary.skipped.len(),
            "auto-map complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_validated() {
        assert!(AutoMapThresholds::new(0.6, 0.4).is_ok());
        assert!(AutoMapThresholds::new(0.4, 0.6).is_err());
        assert!(AutoMapThresholds::new(1.2, 0.4).is_err());
        assert!(AutoMapThresholds::new(0.6, -0.1).is_err());
        assert!(AutoMapThresholds::new(f64::NAN, 0.4).is_err());
    }

    #[test]
    fn bands_are_inclusive_at_lower_bounds() {
        let thresholds = AutoMapThresholds::default();
        assert_eq!(thresholds.categorize(0.60), ConfidenceBand::AutoAccept);
        assert_eq!(thresholds.categorize(0.59), ConfidenceBand::Suggest);
        assert_eq!(thresholds.categorize(0.40), ConfidenceBand::Suggest);
        assert_eq!(thresholds.categorize(0.39), ConfidenceBand::NoMatch);
    }

    #[test]
    fn ties_prefer_the_earlier_column() {
        let columns = vec![
            SourceColumn::new("sheet", "NAME"),
            SourceColumn::new("sheet", "name"),
        ];
        let best = AutoMapper::default().best_candidate("Name", &columns).unwrap();
        assert_eq!(best.column.name, "NAME");
    }
}

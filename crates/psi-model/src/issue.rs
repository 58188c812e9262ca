use std::fmt;

use serde::{Deserialize, Serialize};

use crate::association::Severity;

/// A warning or error found while auditing or importing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub severity: Severity,
    pub message: String,
    /// Record kind the issue concerns.
    pub kind: Option<String>,
    /// Scenario the issue concerns.
    pub scenario: Option<String>,
    /// 1-based source line, when the issue is about one row.
    pub row: Option<usize>,
    pub property: Option<String>,
}

impl ImportIssue {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            kind: None,
            scenario: None,
            row: None,
            property: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    #[must_use]
    pub fn in_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn in_scenario(mut self, scenario: Option<&str>) -> Self {
        self.scenario = scenario.map(str::to_string);
        self
    }

    #[must_use]
    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    #[must_use]
    pub fn for_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity.as_str())?;
        if let Some(kind) = &self.kind {
            write!(f, "[{kind}")?;
            if let Some(scenario) = &self.scenario {
                write!(f, " / {scenario}")?;
            }
            f.write_str("] ")?;
        }
        if let Some(row) = self.row {
            write!(f, "line {row}: ")?;
        }
        f.write_str(&self.message)
    }
}

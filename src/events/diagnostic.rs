use serde::{Deserialize, Serialize};

use crate::models::navigation::SectionKind;

/// Severity levels for diagnostics.
/// Controls the tracing level a diagnostic is logged at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Data or availability problem that made the menu sparser
    Warning,
    /// Expected degradation (e.g. an old response discarded)
    #[default]
    Info,
    /// Routine, only interesting while debugging
    Debug,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }
}

/// Non-fatal problem found while resolving navigation.
///
/// Every variant degrades to fewer visible items, never more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Remote record at `index` was unusable and skipped
    DataQuality { index: usize, detail: String },
    /// Second item with the same path in one section was dropped
    DuplicatePath { section: SectionKind, path: String },
    /// Remote provider failed; static registry used instead
    FetchFailure { error: String },
    /// Route named a module that is not registered
    UnknownModule { segment: String },
    /// `hidden` rule could not be evaluated; item hidden
    PredicateFailed { path: String, error: String },
    /// Fetch completed after a newer one and was discarded
    StaleResponse { sequence: u64, latest: u64 },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DataQuality { .. }
            | Diagnostic::FetchFailure { .. }
            | Diagnostic::PredicateFailed { .. } => Severity::Warning,
            Diagnostic::DuplicatePath { .. } | Diagnostic::StaleResponse { .. } => Severity::Info,
            Diagnostic::UnknownModule { .. } => Severity::Debug,
        }
    }

    /// Writes the diagnostic to the log at its severity.
    pub fn log(&self) {
        match self.severity() {
            Severity::Warning => tracing::warn!(diagnostic = ?self, "navigation degraded"),
            Severity::Info => tracing::info!(diagnostic = ?self, "navigation adjusted"),
            Severity::Debug => tracing::debug!(diagnostic = ?self, "navigation note"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_problems_are_warnings() {
        let diagnostic = Diagnostic::DataQuality { index: 2, detail: "missing code".into() };
        assert_eq!(diagnostic.severity(), Severity::Warning);
        assert_eq!(Diagnostic::UnknownModule { segment: "x".into() }.severity(), Severity::Debug);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let value = serde_json::to_value(Diagnostic::StaleResponse { sequence: 1, latest: 2 }).unwrap();
        assert_eq!(value["kind"], "stale_response");
        assert_eq!(value["latest"], 2);
    }
}

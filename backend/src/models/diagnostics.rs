//! Non-fatal findings recorded while building a report
//!
//! Only structurally invalid input aborts a request. Everything else (short
//! histories, bad targets, out-of-range parameters, inconsistent scenario
//! weights) is recorded here and travels with the report, so the caller
//! always receives a complete report shape.

use serde::{Deserialize, Serialize};

/// Category of a recorded finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Series shorter than a method's minimum sample size
    InsufficientData,
    /// Missing or non-positive KPI target
    InvalidTarget,
    /// Sibling scenario weights do not sum to 100
    InconsistentScenarioProbabilities,
    /// Parameter clamped into its valid range
    ParameterOutOfRange,
    /// Reference to an unknown KPI, action or dependency
    UnknownReference,
    /// Dependency cycle broken deterministically
    DependencyCycle,
    /// Requested Monte Carlo iterations reduced to the configured cap
    IterationCapApplied,
    /// Improvement percentage undefined because the baseline is zero
    ZeroBaseline,
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Id of the KPI / scenario / action concerned
    pub subject: String,
    pub message: String,
}

/// An item left out of the computation, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub subject: String,
    pub reason: String,
}

/// Append-only log of findings for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticLog {
    diagnostics: Vec<Diagnostic>,
    exclusions: Vec<Exclusion>,
}

impl DiagnosticLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding (also emitted as a `warn` trace event)
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        tracing::warn!(
            kind = ?diagnostic.kind,
            subject = %diagnostic.subject,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    /// Record an excluded item
    pub fn exclude(&mut self, subject: impl Into<String>, reason: impl Into<String>) {
        let exclusion = Exclusion {
            subject: subject.into(),
            reason: reason.into(),
        };
        tracing::debug!(subject = %exclusion.subject, reason = %exclusion.reason, "excluded");
        self.exclusions.push(exclusion);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty() && self.exclusions.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// Findings of one kind
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_and_filters() {
        let mut log = DiagnosticLog::new();
        assert!(log.is_empty());

        log.record(DiagnosticKind::InvalidTarget, "kpi_1", "target missing");
        log.record(DiagnosticKind::InsufficientData, "kpi_2", "2 points");
        log.exclude("kpi_3", "no history");

        assert_eq!(log.len(), 2);
        assert_eq!(log.of_kind(DiagnosticKind::InvalidTarget).len(), 1);
        assert!(log.has(DiagnosticKind::InsufficientData));
        assert!(!log.has(DiagnosticKind::DependencyCycle));
        assert_eq!(log.exclusions()[0].subject, "kpi_3");
    }
}

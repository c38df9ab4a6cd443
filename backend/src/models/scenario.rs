//! Scenario definitions
//!
//! A scenario is a weighted hypothesis: a set of actions with execution
//! parameters plus external assumptions. Payloads are validated once, at the
//! boundary, by [`Scenario::sanitized`]; out-of-range values are clamped and
//! reported rather than rejected, so one malformed scenario cannot abort a
//! multi-scenario batch.

use crate::models::diagnostics::{DiagnosticKind, DiagnosticLog};
use serde::{Deserialize, Serialize};

/// Tolerance when checking that sibling scenario weights sum to 100
const PROBABILITY_SUM_TOLERANCE: f64 = 0.5;

/// Execution parameters of one action inside a scenario
///
/// Timing is expressed in projection steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAction {
    /// Reference into the action catalogue
    pub action_id: String,

    /// Planned completion [0, 100]
    pub completion_rate: f64,

    /// Steps before the action starts
    #[serde(default)]
    pub start_delay: u32,

    /// Steps the action runs for (at least 1 after sanitizing)
    pub duration: u32,

    /// Share of capacity the action occupies while running [0, 100]
    pub resource_requirement: f64,

    /// Probability the action delivers its impact [0, 100]
    pub success_probability: f64,

    /// Actions that must finish before this one starts
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ScenarioAction {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            completion_rate: 100.0,
            start_delay: 0,
            duration: 1,
            resource_requirement: 0.0,
            success_probability: 100.0,
            depends_on: Vec::new(),
        }
    }

    pub fn with_timing(mut self, start_delay: u32, duration: u32) -> Self {
        self.start_delay = start_delay;
        self.duration = duration;
        self
    }

    pub fn with_rates(mut self, completion_rate: f64, success_probability: f64) -> Self {
        self.completion_rate = completion_rate;
        self.success_probability = success_probability;
        self
    }

    pub fn with_resource(mut self, resource_requirement: f64) -> Self {
        self.resource_requirement = resource_requirement;
        self
    }

    pub fn with_dependency(mut self, action_id: impl Into<String>) -> Self {
        self.depends_on.push(action_id.into());
        self
    }

    /// First step the action occupies
    pub fn start(&self) -> u32 {
        self.start_delay
    }

    /// Step at which the action finishes
    pub fn end(&self) -> u32 {
        self.start_delay.saturating_add(self.duration)
    }

    /// Whether step `m` falls inside `[start, start + duration]`
    pub fn is_active_at(&self, m: u32) -> bool {
        m >= self.start() && m <= self.end()
    }

    /// Fraction of the action's duration elapsed at step `m` (capped at 1)
    pub fn time_progress(&self, m: u32) -> f64 {
        if m < self.start_delay {
            return 0.0;
        }
        let duration = self.duration.max(1) as f64;
        ((m - self.start_delay + 1) as f64 / duration).min(1.0)
    }
}

/// Assumption category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionCategory {
    Market,
    Resource,
    External,
    Regulatory,
}

/// External assumption attached to a scenario
///
/// Feeds scenario risk only; it never enters per-KPI arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAssumption {
    pub category: AssumptionCategory,

    #[serde(default)]
    pub description: String,

    /// Signed impact [-100, 100]
    pub impact: f64,

    /// Probability the assumption holds [0, 100]
    pub probability: f64,
}

/// A weighted planning hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Probability weight [0, 100]; siblings should sum to 100
    pub probability: f64,

    /// A required scenario with no actions is a hard error; an optional one is
    /// excluded from the report instead.
    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(default)]
    pub actions: Vec<ScenarioAction>,

    #[serde(default)]
    pub assumptions: Vec<ScenarioAssumption>,
}

fn default_required() -> bool {
    true
}

impl Scenario {
    pub fn new(id: impl Into<String>, probability: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            probability,
            required: true,
            actions: Vec::new(),
            assumptions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: ScenarioAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_assumption(mut self, assumption: ScenarioAssumption) -> Self {
        self.assumptions.push(assumption);
        self
    }

    /// Copy of the scenario with every parameter clamped into range
    ///
    /// Each clamp is recorded as a `ParameterOutOfRange` diagnostic. A zero
    /// duration is raised to one step.
    pub fn sanitized(&self, log: &mut DiagnosticLog) -> Scenario {
        let mut out = self.clone();
        out.probability = clamp_recorded(
            self.probability,
            0.0,
            100.0,
            &self.id,
            "scenario probability",
            log,
        );

        for action in &mut out.actions {
            let subject = format!("{}/{}", self.id, action.action_id);
            action.completion_rate = clamp_recorded(
                action.completion_rate,
                0.0,
                100.0,
                &subject,
                "completion_rate",
                log,
            );
            action.resource_requirement = clamp_recorded(
                action.resource_requirement,
                0.0,
                100.0,
                &subject,
                "resource_requirement",
                log,
            );
            action.success_probability = clamp_recorded(
                action.success_probability,
                0.0,
                100.0,
                &subject,
                "success_probability",
                log,
            );
            if action.duration == 0 {
                log.record(
                    DiagnosticKind::ParameterOutOfRange,
                    subject.clone(),
                    "duration 0 raised to 1",
                );
                action.duration = 1;
            }
        }

        for (idx, assumption) in out.assumptions.iter_mut().enumerate() {
            let subject = format!("{}/assumption[{}]", self.id, idx);
            assumption.impact =
                clamp_recorded(assumption.impact, -100.0, 100.0, &subject, "impact", log);
            assumption.probability = clamp_recorded(
                assumption.probability,
                0.0,
                100.0,
                &subject,
                "probability",
                log,
            );
        }

        out
    }
}

/// Clamp `value` into `[min, max]`, recording a diagnostic when it moved
///
/// Non-finite values are replaced by `min`.
fn clamp_recorded(
    value: f64,
    min: f64,
    max: f64,
    subject: &str,
    field: &str,
    log: &mut DiagnosticLog,
) -> f64 {
    let clamped = if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    };
    if clamped != value {
        log.record(
            DiagnosticKind::ParameterOutOfRange,
            subject,
            format!("{field} {value} clamped to {clamped} (range [{min}, {max}])"),
        );
    }
    clamped
}

/// Warn when sibling scenario probabilities do not sum to 100
///
/// Returns the actual sum. This is a warning, never an abort.
pub fn check_probability_sum(scenarios: &[Scenario], log: &mut DiagnosticLog) -> f64 {
    let sum: f64 = scenarios.iter().map(|s| s.probability).sum();
    if !scenarios.is_empty() && (sum - 100.0).abs() > PROBABILITY_SUM_TOLERANCE {
        log.record(
            DiagnosticKind::InconsistentScenarioProbabilities,
            "scenarios",
            format!("scenario probabilities sum to {sum:.2}, expected 100"),
        );
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_window_is_closed() {
        let action = ScenarioAction::new("a").with_timing(2, 3);
        assert!(!action.is_active_at(1));
        assert!(action.is_active_at(2));
        assert!(action.is_active_at(5));
        assert!(!action.is_active_at(6));
    }

    #[test]
    fn test_time_progress_caps_at_one() {
        let action = ScenarioAction::new("a").with_timing(2, 4);
        assert_eq!(action.time_progress(1), 0.0);
        assert!((action.time_progress(2) - 0.25).abs() < 1e-12);
        assert!((action.time_progress(3) - 0.5).abs() < 1e-12);
        assert_eq!(action.time_progress(10), 1.0);
    }

    #[test]
    fn test_sanitize_clamps_and_records() {
        let scenario = Scenario::new("s1", 120.0).with_action(
            ScenarioAction::new("a")
                .with_rates(140.0, -5.0)
                .with_resource(50.0)
                .with_timing(0, 0),
        );
        let mut log = DiagnosticLog::new();
        let clean = scenario.sanitized(&mut log);

        assert_eq!(clean.probability, 100.0);
        assert_eq!(clean.actions[0].completion_rate, 100.0);
        assert_eq!(clean.actions[0].success_probability, 0.0);
        assert_eq!(clean.actions[0].resource_requirement, 50.0);
        assert_eq!(clean.actions[0].duration, 1);
        assert_eq!(log.of_kind(DiagnosticKind::ParameterOutOfRange).len(), 4);
    }

    #[test]
    fn test_probability_sum_warning() {
        let mut log = DiagnosticLog::new();
        let sum = check_probability_sum(
            &[Scenario::new("a", 40.0), Scenario::new("b", 40.0)],
            &mut log,
        );
        assert_eq!(sum, 80.0);
        assert!(log.has(DiagnosticKind::InconsistentScenarioProbabilities));

        let mut ok = DiagnosticLog::new();
        check_probability_sum(&[Scenario::new("a", 60.0), Scenario::new("b", 40.0)], &mut ok);
        assert!(ok.is_empty());
    }
}

//! Scenarios validated and resolved against the action catalogue
//!
//! Preparation happens once per request, at the boundary: parameters are
//! clamped, action references resolved, unknown references reported. All
//! downstream arithmetic works on [`PreparedScenario`] and never re-validates.

use crate::models::action::{Action, ActionCatalogue};
use crate::models::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::models::scenario::{Scenario, ScenarioAction};
use serde::{Deserialize, Serialize};

/// A scenario action joined with its catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub plan: ScenarioAction,
    pub action: Action,
}

impl PlannedAction {
    pub fn id(&self) -> &str {
        &self.plan.action_id
    }
}

/// Sanitized scenario with resolved actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedScenario {
    pub scenario: Scenario,
    pub actions: Vec<PlannedAction>,
}

impl PreparedScenario {
    /// Sanitize `scenario` and resolve its actions
    ///
    /// Actions missing from the catalogue are excluded with a reason.
    pub fn prepare(
        scenario: &Scenario,
        catalogue: &ActionCatalogue,
        log: &mut DiagnosticLog,
    ) -> Self {
        let clean = scenario.sanitized(log);
        let mut actions = Vec::with_capacity(clean.actions.len());
        for plan in &clean.actions {
            match catalogue.get(&plan.action_id) {
                Some(action) => actions.push(PlannedAction {
                    plan: plan.clone(),
                    action: action.clone(),
                }),
                None => {
                    let subject = format!("{}/{}", clean.id, plan.action_id);
                    log.record(
                        DiagnosticKind::UnknownReference,
                        subject.clone(),
                        format!("action {} not found in catalogue", plan.action_id),
                    );
                    log.exclude(subject, "unknown action reference");
                }
            }
        }
        Self {
            scenario: clean,
            actions,
        }
    }

    pub fn id(&self) -> &str {
        &self.scenario.id
    }

    /// Scenario probability weight (0-100)
    pub fn probability(&self) -> f64 {
        self.scenario.probability
    }
}

//! Weighted action priority
//!
//! ```text
//! priority = 0.4 × min(1, Σ|impact| / normalization)
//!          + 0.3 × success / 100
//!          + 0.2 × min(1, completion / resource / 2)      (1 when resource = 0)
//!          + 0.1 × min(1, reference_duration / duration)
//! ```

use crate::models::PlannedAction;
use crate::sequencing::SequencingConfig;
use serde::{Deserialize, Serialize};

const IMPACT_WEIGHT: f64 = 0.4;
const SUCCESS_WEIGHT: f64 = 0.3;
const EFFICIENCY_WEIGHT: f64 = 0.2;
const SPEED_WEIGHT: f64 = 0.1;

/// Priority score of one action with its weighted components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPriority {
    pub action_id: String,
    /// Weighted sum in [0, 1]
    pub score: f64,
    pub impact_component: f64,
    pub success_component: f64,
    pub efficiency_component: f64,
    pub speed_component: f64,
    /// score above the critical threshold
    pub critical_path: bool,
}

/// Score one action
pub fn score_action(planned: &PlannedAction, config: &SequencingConfig) -> ActionPriority {
    let plan = &planned.plan;

    let normalization = if config.impact_normalization > 0.0 {
        config.impact_normalization
    } else {
        1.0
    };
    let impact = (planned.action.total_impact() / normalization).min(1.0);
    let success = plan.success_probability / 100.0;
    let efficiency = if plan.resource_requirement > 0.0 {
        (plan.completion_rate / plan.resource_requirement / 2.0).min(1.0)
    } else {
        1.0
    };
    let speed = (config.reference_duration / plan.duration.max(1) as f64).min(1.0);

    let impact_component = IMPACT_WEIGHT * impact;
    let success_component = SUCCESS_WEIGHT * success;
    let efficiency_component = EFFICIENCY_WEIGHT * efficiency;
    let speed_component = SPEED_WEIGHT * speed;
    let score = impact_component + success_component + efficiency_component + speed_component;

    ActionPriority {
        action_id: plan.action_id.clone(),
        score,
        impact_component,
        success_component,
        efficiency_component,
        speed_component,
        critical_path: score > config.critical_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, ScenarioAction};

    fn planned(impact: f64, plan: ScenarioAction) -> PlannedAction {
        PlannedAction {
            action: Action::new(plan.action_id.clone()).with_impact("k", impact),
            plan,
        }
    }

    #[test]
    fn test_perfect_action_scores_one() {
        let p = score_action(
            &planned(1.5, ScenarioAction::new("a").with_resource(10.0)),
            &SequencingConfig::default(),
        );
        assert!((p.score - 1.0).abs() < 1e-12);
        assert!(p.critical_path);
    }

    #[test]
    fn test_components() {
        // impact 0.5 → 0.2; success 50 → 0.15; 100/100/2 → 0.1; 120 steps → 0.05
        let p = score_action(
            &planned(
                0.5,
                ScenarioAction::new("a")
                    .with_rates(100.0, 50.0)
                    .with_resource(100.0)
                    .with_timing(0, 120),
            ),
            &SequencingConfig::default(),
        );
        assert!((p.score - 0.5).abs() < 1e-12);
        assert!(!p.critical_path);
    }
}

//! Shared outcome function
//!
//! ```text
//! benefit(action) = base_benefit × completion/100 × success/100
//! cost(action)    = estimated_cost, or resource × duration × cost_per_unit_step
//! roi(scenario)   = (Σ benefit − Σ cost) / Σ cost × 100     (0 when Σ cost = 0)
//! roi(portfolio)  = Σ p_s × roi_s / Σ p_s                    (plain mean when Σ p = 0)
//! ```
//!
//! `base_benefit` is the action's `expected_benefit`, or Σ|impact_score| ×
//! `benefit_per_impact_point` when the action carries no estimate.

use crate::models::{PlannedAction, PreparedScenario};
use crate::simulation::sensitivity::SensitivityParameter;
use serde::{Deserialize, Serialize};

/// Economic constants for actions without explicit estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Monetary benefit of one unit of summed |impact_score| at full delivery
    pub benefit_per_impact_point: f64,

    /// Cost of one resource-% occupied for one step
    pub cost_per_resource_unit_step: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            benefit_per_impact_point: 1_000_000.0,
            cost_per_resource_unit_step: 1_000.0,
        }
    }
}

/// Multiplicative factors applied to action parameters for one evaluation
///
/// Scaled rates are floored at 0 but not capped at 100: inputs are clamped
/// once by [`Scenario::sanitized`](crate::models::Scenario::sanitized), and a
/// +10% variation of a 100% completion rate must move the outcome. Duration
/// stays at least one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    pub completion_rate: f64,
    pub success_probability: f64,
    pub resource_requirement: f64,
    pub duration: f64,
    pub cost: f64,
    pub benefit: f64,
}

impl Default for Perturbation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Perturbation {
    /// No change to any parameter
    pub const fn identity() -> Self {
        Self {
            completion_rate: 1.0,
            success_probability: 1.0,
            resource_requirement: 1.0,
            duration: 1.0,
            cost: 1.0,
            benefit: 1.0,
        }
    }

    /// Monte Carlo noise: `u` at full magnitude on completion, half on success
    pub fn uniform_noise(u: f64) -> Self {
        Self {
            completion_rate: 1.0 + u,
            success_probability: 1.0 + u / 2.0,
            ..Self::identity()
        }
    }

    /// Vary one parameter by `variation_pct` percent, leave the rest alone
    pub fn single(parameter: SensitivityParameter, variation_pct: f64) -> Self {
        let factor = 1.0 + variation_pct / 100.0;
        let mut p = Self::identity();
        match parameter {
            SensitivityParameter::CompletionRate => p.completion_rate = factor,
            SensitivityParameter::SuccessProbability => p.success_probability = factor,
            SensitivityParameter::ResourceRequirement => p.resource_requirement = factor,
            SensitivityParameter::Duration => p.duration = factor,
            SensitivityParameter::Cost => p.cost = factor,
            SensitivityParameter::Benefit => p.benefit = factor,
        }
        p
    }
}

/// Economics of one scenario under one perturbation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario_id: String,
    pub probability: f64,
    pub benefit: f64,
    pub cost: f64,
    /// (benefit − cost) ÷ cost × 100
    pub roi: f64,
}

/// Every scenario plus the probability-weighted combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOutcome {
    pub scenarios: Vec<ScenarioOutcome>,
    pub roi: f64,
}

/// Pure outcome function with injected economics
#[derive(Debug, Clone, Default)]
pub struct OutcomeEvaluator {
    config: EvaluationConfig,
}

impl OutcomeEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Benefit and cost of one action
    fn action_economics(&self, planned: &PlannedAction, p: &Perturbation) -> (f64, f64) {
        let plan = &planned.plan;
        let completion = (plan.completion_rate * p.completion_rate).max(0.0);
        let success = (plan.success_probability * p.success_probability).max(0.0);
        let resource = (plan.resource_requirement * p.resource_requirement).max(0.0);
        let duration = (plan.duration as f64 * p.duration).max(1.0);

        let benefit =
            self.base_benefit(planned) * p.benefit * (completion / 100.0) * (success / 100.0);
        let cost = (self.base_cost(planned, resource, duration) * p.cost).max(0.0);

        (benefit, cost)
    }

    fn base_benefit(&self, planned: &PlannedAction) -> f64 {
        planned
            .action
            .expected_benefit
            .unwrap_or_else(|| planned.action.total_impact() * self.config.benefit_per_impact_point)
    }

    fn base_cost(&self, planned: &PlannedAction, resource: f64, duration: f64) -> f64 {
        planned
            .action
            .estimated_cost
            .unwrap_or_else(|| resource * duration * self.config.cost_per_resource_unit_step)
    }

    /// Unperturbed value of `parameter` for one action, with benefit and cost
    /// resolved the same way the outcome function resolves them
    pub fn parameter_value(&self, planned: &PlannedAction, parameter: SensitivityParameter) -> f64 {
        let plan = &planned.plan;
        let duration = plan.duration.max(1) as f64;
        match parameter {
            SensitivityParameter::CompletionRate => plan.completion_rate,
            SensitivityParameter::SuccessProbability => plan.success_probability,
            SensitivityParameter::ResourceRequirement => plan.resource_requirement,
            SensitivityParameter::Duration => duration,
            SensitivityParameter::Cost => {
                self.base_cost(planned, plan.resource_requirement, duration)
            }
            SensitivityParameter::Benefit => self.base_benefit(planned),
        }
    }

    /// Economics of one scenario
    pub fn evaluate_scenario(
        &self,
        scenario: &PreparedScenario,
        perturbation: &Perturbation,
    ) -> ScenarioOutcome {
        let (benefit, cost) = scenario
            .actions
            .iter()
            .map(|a| self.action_economics(a, perturbation))
            .fold((0.0, 0.0), |(b, c), (ab, ac)| (b + ab, c + ac));

        ScenarioOutcome {
            scenario_id: scenario.id().to_string(),
            probability: scenario.probability(),
            benefit,
            cost,
            roi: roi(benefit, cost),
        }
    }

    /// Every scenario plus the weighted portfolio ROI
    pub fn evaluate(
        &self,
        scenarios: &[PreparedScenario],
        perturbation: &Perturbation,
    ) -> PortfolioOutcome {
        let outcomes: Vec<ScenarioOutcome> = scenarios
            .iter()
            .map(|s| self.evaluate_scenario(s, perturbation))
            .collect();
        let roi = weighted_roi(outcomes.iter().map(|o| (o.probability, o.roi)));
        PortfolioOutcome {
            scenarios: outcomes,
            roi,
        }
    }

    /// Portfolio ROI only; the Monte Carlo hot path
    pub fn portfolio_roi(&self, scenarios: &[PreparedScenario], perturbation: &Perturbation) -> f64 {
        weighted_roi(scenarios.iter().map(|s| {
            let o = self.evaluate_scenario(s, perturbation);
            (o.probability, o.roi)
        }))
    }
}

fn roi(benefit: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        (benefit - cost) / cost * 100.0
    } else {
        0.0
    }
}

/// Probability-weighted mean of `(probability, roi)` pairs
fn weighted_roi(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (mut weighted, mut weight, mut plain, mut n) = (0.0, 0.0, 0.0, 0usize);
    for (p, r) in pairs {
        weighted += p * r;
        weight += p;
        plain += r;
        n += 1;
    }
    if weight > 0.0 {
        weighted / weight
    } else if n > 0 {
        plain / n as f64
    } else {
        0.0
    }
}

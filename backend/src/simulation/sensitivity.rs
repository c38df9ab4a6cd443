//! One-at-a-time sensitivity of portfolio ROI
//!
//! Each (parameter, variation) pair scales that parameter on every action,
//! recomputes ROI through the shared evaluator with no random noise, and
//! records the % change from the unperturbed ROI. Variations are relative to
//! each action's own value; the reported `baseline_value` is the mean of
//! those values across all planned actions.
//!
//! ```text
//! elasticity  = mean(|impact %|) / mean(|variation %|)
//! correlation = pearson(variations, impacts)
//! ```

use crate::models::PreparedScenario;
use crate::simulation::evaluator::{OutcomeEvaluator, Perturbation};
use crate::stats::descriptive::{mean, pearson};
use serde::{Deserialize, Serialize};

/// Number of parameters labelled most / least sensitive
const LABELLED_PER_END: usize = 3;

/// Action parameter that can be varied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityParameter {
    CompletionRate,
    SuccessProbability,
    ResourceRequirement,
    Duration,
    Cost,
    Benefit,
}

/// A parameter and the % variations to apply to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySpec {
    pub parameter: SensitivityParameter,
    pub variations: Vec<f64>,
}

impl SensitivitySpec {
    pub fn new(parameter: SensitivityParameter, variations: Vec<f64>) -> Self {
        Self {
            parameter,
            variations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    pub parameters: Vec<SensitivitySpec>,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        let variations = vec![-20.0, -10.0, -5.0, 5.0, 10.0, 20.0];
        Self {
            parameters: [
                SensitivityParameter::CompletionRate,
                SensitivityParameter::SuccessProbability,
                SensitivityParameter::ResourceRequirement,
                SensitivityParameter::Duration,
                SensitivityParameter::Cost,
            ]
            .into_iter()
            .map(|p| SensitivitySpec::new(p, variations.clone()))
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLabel {
    MostSensitive,
    Moderate,
    LeastSensitive,
}

/// Outcome at one variation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub variation_pct: f64,
    pub roi: f64,
    /// Change from the baseline ROI (see `SensitivityResult::relative_to_baseline`)
    pub impact_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSensitivity {
    pub parameter: SensitivityParameter,
    /// Mean unperturbed value across every planned action (0 with no actions)
    pub baseline_value: f64,
    /// 1-based, by descending elasticity
    pub rank: usize,
    pub elasticity: f64,
    /// `None` when either side has no variance
    pub correlation: Option<f64>,
    pub label: SensitivityLabel,
    pub points: Vec<SensitivityPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub baseline_roi: f64,
    /// False when the baseline ROI is 0: impacts are then ROI point
    /// differences instead of relative % changes
    pub relative_to_baseline: bool,
    /// Ranked, most sensitive first
    pub parameters: Vec<ParameterSensitivity>,
}

impl SensitivityResult {
    pub fn most_sensitive(&self) -> Option<&ParameterSensitivity> {
        self.parameters.first()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SensitivityAnalyzer {
    evaluator: OutcomeEvaluator,
    config: SensitivityConfig,
}

impl SensitivityAnalyzer {
    pub fn new(evaluator: OutcomeEvaluator, config: SensitivityConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn analyze(&self, scenarios: &[PreparedScenario]) -> SensitivityResult {
        let baseline_roi = self
            .evaluator
            .portfolio_roi(scenarios, &Perturbation::identity());
        let relative = baseline_roi.abs() > f64::EPSILON;

        let mut parameters: Vec<ParameterSensitivity> = self
            .config
            .parameters
            .iter()
            .map(|spec| {
                let points: Vec<SensitivityPoint> = spec
                    .variations
                    .iter()
                    .map(|&variation_pct| {
                        let roi = self.evaluator.portfolio_roi(
                            scenarios,
                            &Perturbation::single(spec.parameter, variation_pct),
                        );
                        let impact_pct = if relative {
                            (roi - baseline_roi) / baseline_roi.abs() * 100.0
                        } else {
                            roi - baseline_roi
                        };
                        SensitivityPoint {
                            variation_pct,
                            roi,
                            impact_pct,
                        }
                    })
                    .collect();

                let variations: Vec<f64> = points.iter().map(|p| p.variation_pct).collect();
                let impacts: Vec<f64> = points.iter().map(|p| p.impact_pct).collect();
                let mean_variation = mean(&variations.iter().map(|v| v.abs()).collect::<Vec<_>>());
                let elasticity = if mean_variation > 0.0 {
                    mean(&impacts.iter().map(|v| v.abs()).collect::<Vec<_>>()) / mean_variation
                } else {
                    0.0
                };

                ParameterSensitivity {
                    parameter: spec.parameter,
                    baseline_value: self.baseline_value(scenarios, spec.parameter),
                    rank: 0,
                    elasticity,
                    correlation: pearson(&variations, &impacts),
                    label: SensitivityLabel::Moderate,
                    points,
                }
            })
            .collect();

        // Stable sort keeps configuration order among equal elasticities
        parameters.sort_by(|a, b| b.elasticity.total_cmp(&a.elasticity));
        let n = parameters.len();
        for (i, p) in parameters.iter_mut().enumerate() {
            p.rank = i + 1;
            p.label = if i < LABELLED_PER_END {
                SensitivityLabel::MostSensitive
            } else if i + LABELLED_PER_END >= n {
                SensitivityLabel::LeastSensitive
            } else {
                SensitivityLabel::Moderate
            };
        }

        tracing::debug!(parameters = n, baseline_roi, "sensitivity analyzed");
        SensitivityResult {
            baseline_roi,
            relative_to_baseline: relative,
            parameters,
        }
    }

    fn baseline_value(&self, scenarios: &[PreparedScenario], parameter: SensitivityParameter) -> f64 {
        let values: Vec<f64> = scenarios
            .iter()
            .flat_map(|s| &s.actions)
            .map(|a| self.evaluator.parameter_value(a, parameter))
            .collect();
        mean(&values)
    }
}

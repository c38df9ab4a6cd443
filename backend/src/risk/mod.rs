//! Plan risk scoring
//!
//! Static category factors (configured probability and impact) are combined
//! with factors derived from the scenarios themselves:
//!
//! ```text
//! execution  = mean(100 − success_probability)            over actions
//! assumption = mean((100 − probability) × |impact| / 100)  over assumptions
//! ```
//!
//! Derived factors carry impact 100 so their score equals the measure. The
//! overall score is the mean of every factor's `probability × impact / 100`.

use crate::models::PreparedScenario;
use crate::stats::descriptive::mean;
use crate::stats::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Execution,
    Resource,
    Market,
    Technical,
    Assumption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSource {
    Static,
    Derived,
}

/// A configured category risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRiskFactor {
    pub category: RiskCategory,
    pub name: String,
    /// [0, 100]
    pub probability: f64,
    /// [0, 100]
    pub impact: f64,
    pub mitigation: String,
}

impl StaticRiskFactor {
    fn new(category: RiskCategory, name: &str, probability: f64, impact: f64, mitigation: &str) -> Self {
        Self {
            category,
            name: name.to_string(),
            probability,
            impact,
            mitigation: mitigation.to_string(),
        }
    }
}

/// Score thresholds for severity labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBands {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            critical: 70.0,
            high: 50.0,
            medium: 30.0,
        }
    }
}

impl SeverityBands {
    pub fn classify(&self, score: f64) -> Severity {
        if score >= self.critical {
            Severity::Critical
        } else if score >= self.high {
            Severity::High
        } else if score >= self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub static_factors: Vec<StaticRiskFactor>,
    /// Overall score above this raises the high-risk advisory
    pub advisory_threshold: f64,
    pub bands: SeverityBands,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            static_factors: vec![
                StaticRiskFactor::new(
                    RiskCategory::Execution,
                    "execution",
                    30.0,
                    60.0,
                    "Assign owners and milestone reviews to every action",
                ),
                StaticRiskFactor::new(
                    RiskCategory::Resource,
                    "resource",
                    40.0,
                    50.0,
                    "Reserve capacity buffers and stagger resource-heavy actions",
                ),
                StaticRiskFactor::new(
                    RiskCategory::Market,
                    "market",
                    25.0,
                    70.0,
                    "Track leading market indicators and prepare contingency plans",
                ),
                StaticRiskFactor::new(
                    RiskCategory::Technical,
                    "technical",
                    20.0,
                    40.0,
                    "Pilot technical changes before full rollout",
                ),
            ],
            advisory_threshold: 70.0,
            bands: SeverityBands::default(),
        }
    }
}

/// A scored risk factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub category: RiskCategory,
    pub source: RiskSource,
    pub probability: f64,
    pub impact: f64,
    /// probability × impact / 100
    pub score: f64,
    pub severity: Severity,
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mitigation {
    pub rank: usize,
    pub factor: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Highest score first
    pub factors: Vec<RiskFactor>,
    pub overall_score: f64,
    pub overall_severity: Severity,
    pub mitigations: Vec<Mitigation>,
    /// Overall score above the advisory threshold; must be surfaced
    pub high_risk_advisory: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RiskAnalyzer {
    config: RiskConfig,
}

impl RiskAnalyzer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Risk of the combined plan across `scenarios`
    pub fn analyze(&self, scenarios: &[PreparedScenario]) -> RiskReport {
        let bands = &self.config.bands;
        let mut factors: Vec<RiskFactor> = self
            .config
            .static_factors
            .iter()
            .map(|f| {
                self.factor(
                    &f.name,
                    f.category,
                    RiskSource::Static,
                    f.probability,
                    f.impact,
                    &f.mitigation,
                )
            })
            .collect();

        let shortfalls: Vec<f64> = scenarios
            .iter()
            .flat_map(|s| s.actions.iter())
            .map(|a| 100.0 - a.plan.success_probability)
            .collect();
        if !shortfalls.is_empty() {
            factors.push(self.factor(
                "scenario_execution",
                RiskCategory::Execution,
                RiskSource::Derived,
                mean(&shortfalls),
                100.0,
                "Raise success probability of weak actions or add fallbacks",
            ));
        }

        let exposures: Vec<f64> = scenarios
            .iter()
            .flat_map(|s| s.scenario.assumptions.iter())
            .map(|a| (100.0 - a.probability) * a.impact.abs() / 100.0)
            .collect();
        if !exposures.is_empty() {
            factors.push(self.factor(
                "scenario_assumptions",
                RiskCategory::Assumption,
                RiskSource::Derived,
                mean(&exposures),
                100.0,
                "Validate uncertain assumptions early and define triggers to revisit the plan",
            ));
        }

        // Stable sort keeps configured order among equal scores
        factors.sort_by(|a, b| b.score.total_cmp(&a.score));

        let overall_score = mean(&factors.iter().map(|f| f.score).collect::<Vec<_>>());
        let mitigations = factors
            .iter()
            .enumerate()
            .map(|(i, f)| Mitigation {
                rank: i + 1,
                factor: f.name.clone(),
                action: f.mitigation.clone(),
            })
            .collect();
        let high_risk_advisory = overall_score > self.config.advisory_threshold;
        if high_risk_advisory {
            tracing::warn!(overall_score, "high-risk advisory raised");
        }

        RiskReport {
            overall_severity: bands.classify(overall_score),
            factors,
            overall_score,
            mitigations,
            high_risk_advisory,
        }
    }

    fn factor(
        &self,
        name: &str,
        category: RiskCategory,
        source: RiskSource,
        probability: f64,
        impact: f64,
        mitigation: &str,
    ) -> RiskFactor {
        let score = probability * impact / 100.0;
        RiskFactor {
            name: name.to_string(),
            category,
            source,
            probability,
            impact,
            score,
            severity: self.config.bands.classify(score),
            mitigation: mitigation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Action, ActionCatalogue, AssumptionCategory, DiagnosticLog, Scenario, ScenarioAction,
        ScenarioAssumption,
    };

    fn scenario() -> PreparedScenario {
        let catalogue = ActionCatalogue::from_actions(&[Action::new("a"), Action::new("b")]);
        let s = Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("a").with_rates(100.0, 40.0))
            .with_action(ScenarioAction::new("b").with_rates(100.0, 80.0))
            .with_assumption(ScenarioAssumption {
                category: AssumptionCategory::Market,
                description: "demand holds".to_string(),
                impact: -60.0,
                probability: 50.0,
            });
        PreparedScenario::prepare(&s, &catalogue, &mut DiagnosticLog::new())
    }

    #[test]
    fn test_derived_factors_and_overall() {
        let report = RiskAnalyzer::default().analyze(&[scenario()]);
        assert_eq!(report.factors.len(), 6);
        assert_eq!(report.factors[0].name, "scenario_execution");
        assert!((report.factors[0].score - 40.0).abs() < 1e-9);
        assert_eq!(report.factors[0].severity, Severity::Medium);
        assert!((report.factors[1].score - 30.0).abs() < 1e-9);
        // (18 + 20 + 17.5 + 8 + 40 + 30) / 6
        assert!((report.overall_score - 22.25).abs() < 1e-9);
        assert_eq!(report.overall_severity, Severity::Low);
        assert!(!report.high_risk_advisory);
        assert_eq!(report.mitigations[0].rank, 1);
    }

    #[test]
    fn test_advisory_above_threshold() {
        let analyzer = RiskAnalyzer::new(RiskConfig {
            static_factors: vec![StaticRiskFactor::new(
                RiskCategory::Market,
                "market",
                90.0,
                90.0,
                "hedge",
            )],
            ..RiskConfig::default()
        });
        let report = analyzer.analyze(&[]);
        assert!((report.overall_score - 81.0).abs() < 1e-9);
        assert!(report.high_risk_advisory);
        assert_eq!(report.overall_severity, Severity::Critical);
    }
}

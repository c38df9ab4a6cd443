//! Scenario orchestrator
//!
//! Runs every component for one planning request and assembles the report:
//!
//! ```text
//! 1. Fingerprint the request
//! 2. Validate structure (duplicate ids, empty required scenarios)
//! 3. Filter series against known KPIs / factories
//! 4. Build performance profiles and KPI correlations
//! 5. Prepare scenarios (clamp parameters, resolve actions)
//! 6. Per scenario: projection, economics, sequence, risk, metrics
//! 7. Portfolio: comparisons, Monte Carlo, sensitivity, overall risk
//! ```
//!
//! The orchestrator holds only immutable configuration; every request works
//! on its own snapshot and produces one complete report.

use crate::models::{
    check_probability_sum, Action, ActionCatalogue, DiagnosticKind, DiagnosticLog, Factory, Kpi,
    KpiSeries, Observation, PreparedScenario, Scenario,
};
use crate::orchestrator::fingerprint::fingerprint;
use crate::profile::{PerformanceProfile, PerformanceProfileBuilder, ProfileConfig, ProfileError};
use crate::projection::{KpiProjection, ProjectionConfig, ScenarioProjector};
use crate::risk::{RiskAnalyzer, RiskConfig, RiskReport};
use crate::sequencing::{ActionSequencer, SequencePlan, SequencingConfig};
use crate::simulation::{
    CancellationToken, EvaluationConfig, MonteCarloConfig, MonteCarloError, MonteCarloResult,
    MonteCarloSimulator, OutcomeEvaluator, Perturbation, ScenarioOutcome, SensitivityAnalyzer,
    SensitivityConfig, SensitivityResult,
};
use crate::stats::{CorrelationResult, StatisticsConfig, TimeSeriesStatistics};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Hard, caller-visible failures
///
/// Everything else is recorded in the report's diagnostics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanningError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("required scenario {scenario_id} has no actions")]
    EmptyScenario { scenario_id: String },

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("KPI {kpi_id} has no usable target")]
    InvalidTarget { kpi_id: String },

    #[error("run cancelled after {completed_iterations} Monte Carlo iterations")]
    Cancelled { completed_iterations: usize },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<ProfileError> for PlanningError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::InvalidTarget { kpi_id } => PlanningError::InvalidTarget { kpi_id },
        }
    }
}

impl From<MonteCarloError> for PlanningError {
    fn from(err: MonteCarloError) -> Self {
        match err {
            MonteCarloError::NoIterations => PlanningError::InvalidInput(err.to_string()),
            MonteCarloError::Cancelled {
                completed_iterations,
            } => PlanningError::Cancelled {
                completed_iterations,
            },
        }
    }
}

impl From<serde_json::Error> for PlanningError {
    fn from(err: serde_json::Error) -> Self {
        PlanningError::Serialization(err.to_string())
    }
}

// ============================================================================
// Configuration and request
// ============================================================================

/// Configuration for every component, injected once
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub statistics: StatisticsConfig,
    pub profile: ProfileConfig,
    pub projection: ProjectionConfig,
    pub evaluation: EvaluationConfig,
    pub monte_carlo: MonteCarloConfig,
    pub sensitivity: SensitivityConfig,
    pub sequencing: SequencingConfig,
    pub risk: RiskConfig,
}

/// Per-request Monte Carlo overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloOverrides {
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
    pub variability_pct: Option<f64>,
    pub confidence_levels: Option<Vec<f64>>,
}

impl MonteCarloOverrides {
    fn apply(&self, base: &MonteCarloConfig) -> MonteCarloConfig {
        let mut config = base.clone();
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(v) = self.variability_pct {
            config.variability_pct = v;
        }
        if let Some(levels) = &self.confidence_levels {
            config.confidence_levels = levels.clone();
        }
        config
    }
}

/// Snapshot of everything one planning run needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    #[serde(default)]
    pub kpis: Vec<Kpi>,
    #[serde(default)]
    pub factories: Vec<Factory>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub series: Vec<KpiSeries>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloOverrides>,
}

// ============================================================================
// Report
// ============================================================================

/// Headline metrics of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub roi: f64,
    /// Mean success probability of its actions (0-100)
    pub success_probability: f64,
    /// First step at which an action finishes; None without actions
    pub time_to_value: Option<u32>,
    /// Peak concurrent resource demand (%)
    pub resource_need: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: String,
    pub name: String,
    pub probability: f64,
    pub projections: Vec<KpiProjection>,
    pub outcome: ScenarioOutcome,
    pub sequence: SequencePlan,
    pub risk: RiskReport,
    pub metrics: ScenarioMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedScenario {
    pub rank: usize,
    pub scenario_id: String,
    pub probability: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// Highest ROI first
    pub ranking: Vec<RankedScenario>,
    /// Probability-weighted ROI across scenarios
    pub expected_roi: f64,
    pub best_scenario: Option<String>,
    pub worst_scenario: Option<String>,
    pub probability_sum: f64,
    pub probabilities_consistent: bool,
}

/// Probability-weighted final-step improvement of one factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryComparison {
    pub rank: usize,
    pub factory_id: String,
    pub name: String,
    pub weighted_improvement_pct: f64,
    /// Number of KPIs projected for the factory
    pub kpis: usize,
}

/// Complete result of one planning request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningReport {
    /// SHA-256 of the canonical request JSON
    pub fingerprint: String,
    pub profiles: Vec<PerformanceProfile>,
    pub correlations: CorrelationResult,
    pub scenarios: Vec<ScenarioResult>,
    pub scenario_comparison: ScenarioComparison,
    pub factory_comparison: Vec<FactoryComparison>,
    /// None when no scenario survived validation
    pub monte_carlo: Option<MonteCarloResult>,
    pub sensitivity: SensitivityResult,
    pub risk: RiskReport,
    pub diagnostics: DiagnosticLog,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Stateless planning engine with injected configuration
#[derive(Debug, Clone, Default)]
pub struct ScenarioOrchestrator {
    config: EngineConfig,
}

impl ScenarioOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one request to completion
    pub fn run(&self, request: &PlanningRequest) -> Result<PlanningReport, PlanningError> {
        self.run_with_cancel(request, &CancellationToken::new())
    }

    /// Run one request, checking `cancel` between Monte Carlo batches
    ///
    /// # Errors
    ///
    /// Only structurally invalid input, a target failure under
    /// `TargetPolicy::Raise`, or cancellation abort the run.
    pub fn run_with_cancel(
        &self,
        request: &PlanningRequest,
        cancel: &CancellationToken,
    ) -> Result<PlanningReport, PlanningError> {
        let fingerprint = fingerprint(request)?;
        let span = tracing::info_span!(
            "planning_request",
            fingerprint = %&fingerprint[..12],
            scenarios = request.scenarios.len()
        );
        let _guard = span.enter();

        validate(request)?;

        let mut log = DiagnosticLog::new();
        let scenarios = active_scenarios(request, &mut log)?;
        check_probability_sum(&scenarios, &mut log);
        let series = known_series(request, &mut log);

        for action in &request.actions {
            for impact in &action.impacts {
                if !request.kpis.iter().any(|k| k.id == impact.kpi_id) {
                    log.record(
                        DiagnosticKind::UnknownReference,
                        &action.id,
                        format!("impact on unknown KPI {}", impact.kpi_id),
                    );
                }
            }
        }

        // History
        let stats = TimeSeriesStatistics::new(self.config.statistics.clone());
        let profiler = PerformanceProfileBuilder::new(stats.clone(), self.config.profile.clone());
        let mut profiles = Vec::new();
        for kpi in &request.kpis {
            profiles.extend(profiler.build(kpi, &series, &mut log)?);
        }
        let correlations = stats.analyze_correlations(&pooled_history(&series));
        tracing::info!(profiles = profiles.len(), "history analyzed");

        // Scenarios
        let catalogue = ActionCatalogue::from_actions(&request.actions);
        let prepared: Vec<PreparedScenario> = scenarios
            .iter()
            .map(|s| PreparedScenario::prepare(s, &catalogue, &mut log))
            .collect();

        let projector = ScenarioProjector::new(stats, self.config.projection.clone());
        let evaluator = OutcomeEvaluator::new(self.config.evaluation.clone());
        let sequencer = ActionSequencer::new(self.config.sequencing.clone());
        let risk = RiskAnalyzer::new(self.config.risk.clone());

        let results: Vec<ScenarioResult> = prepared
            .iter()
            .map(|scenario| {
                let projections = projector.project(scenario, &request.kpis, &series, &mut log);
                let outcome = evaluator.evaluate_scenario(scenario, &Perturbation::identity());
                let sequence = sequencer.sequence(scenario, &mut log);
                let scenario_risk = risk.analyze(std::slice::from_ref(scenario));
                let metrics = scenario_metrics(scenario, &outcome, &sequence, &scenario_risk);
                ScenarioResult {
                    scenario_id: scenario.id().to_string(),
                    name: scenario.scenario.name.clone(),
                    probability: scenario.probability(),
                    projections,
                    outcome,
                    sequence,
                    risk: scenario_risk,
                    metrics,
                }
            })
            .collect();
        tracing::info!(scenarios = results.len(), "scenarios projected");

        // Portfolio
        let portfolio = evaluator.evaluate(&prepared, &Perturbation::identity());
        let scenario_comparison = compare_scenarios(&results, portfolio.roi);
        let factory_comparison = compare_factories(&results, &request.factories);

        let monte_carlo = if prepared.is_empty() {
            None
        } else {
            let config = match &request.monte_carlo {
                Some(overrides) => overrides.apply(&self.config.monte_carlo),
                None => self.config.monte_carlo.clone(),
            };
            let simulator = MonteCarloSimulator::new(evaluator.clone(), config);
            Some(simulator.run(&prepared, cancel, &mut log)?)
        };

        let sensitivity =
            SensitivityAnalyzer::new(evaluator, self.config.sensitivity.clone()).analyze(&prepared);
        let overall_risk = risk.analyze(&prepared);

        tracing::info!(
            diagnostics = log.len(),
            expected_roi = scenario_comparison.expected_roi,
            "planning request complete"
        );

        Ok(PlanningReport {
            fingerprint,
            profiles,
            correlations,
            scenarios: results,
            scenario_comparison,
            factory_comparison,
            monte_carlo,
            sensitivity,
            risk: overall_risk,
            diagnostics: log,
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), PlanningError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(PlanningError::InvalidInput(format!("empty {kind} id")));
        }
        if !seen.insert(id) {
            return Err(PlanningError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn validate(request: &PlanningRequest) -> Result<(), PlanningError> {
    ensure_unique("KPI", request.kpis.iter().map(|k| k.id.as_str()))?;
    ensure_unique("factory", request.factories.iter().map(|f| f.id.as_str()))?;
    ensure_unique("action", request.actions.iter().map(|a| a.id.as_str()))?;
    ensure_unique("scenario", request.scenarios.iter().map(|s| s.id.as_str()))?;

    for scenario in &request.scenarios {
        let mut seen = BTreeSet::new();
        for action in &scenario.actions {
            if !seen.insert(action.action_id.as_str()) {
                return Err(PlanningError::DuplicateId {
                    kind: "scenario action",
                    id: format!("{}/{}", scenario.id, action.action_id),
                });
            }
        }
    }
    Ok(())
}

/// Scenarios that take part in the run
///
/// An empty required scenario is a hard error; an empty optional one is
/// excluded.
fn active_scenarios(
    request: &PlanningRequest,
    log: &mut DiagnosticLog,
) -> Result<Vec<Scenario>, PlanningError> {
    let mut out = Vec::with_capacity(request.scenarios.len());
    for scenario in &request.scenarios {
        if scenario.actions.is_empty() {
            if scenario.required {
                return Err(PlanningError::EmptyScenario {
                    scenario_id: scenario.id.clone(),
                });
            }
            log.exclude(&scenario.id, "optional scenario without actions");
            continue;
        }
        out.push(scenario.clone());
    }
    Ok(out)
}

/// Series whose KPI (and factory, when factories are listed) are known
fn known_series(request: &PlanningRequest, log: &mut DiagnosticLog) -> Vec<KpiSeries> {
    let kpis: BTreeSet<&str> = request.kpis.iter().map(|k| k.id.as_str()).collect();
    let factories: BTreeSet<&str> = request.factories.iter().map(|f| f.id.as_str()).collect();

    request
        .series
        .iter()
        .filter(|s| {
            let subject = format!("{}/{}", s.kpi_id, s.factory_id);
            if !kpis.contains(s.kpi_id.as_str()) {
                log.record(
                    DiagnosticKind::UnknownReference,
                    subject.clone(),
                    format!("series for unknown KPI {}", s.kpi_id),
                );
                log.exclude(subject, "unknown KPI");
                return false;
            }
            if !factories.is_empty() && !factories.contains(s.factory_id.as_str()) {
                log.record(
                    DiagnosticKind::UnknownReference,
                    subject.clone(),
                    format!("series for unknown factory {}", s.factory_id),
                );
                log.exclude(subject, "unknown factory");
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

/// All factories' observations per KPI, for correlation
fn pooled_history(series: &[KpiSeries]) -> BTreeMap<String, Vec<Observation>> {
    let mut pooled: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for s in series {
        pooled
            .entry(s.kpi_id.clone())
            .or_default()
            .extend(s.sorted());
    }
    pooled
}

// ============================================================================
// Aggregation
// ============================================================================

fn scenario_metrics(
    scenario: &PreparedScenario,
    outcome: &ScenarioOutcome,
    sequence: &SequencePlan,
    risk: &RiskReport,
) -> ScenarioMetrics {
    let success: Vec<f64> = scenario
        .actions
        .iter()
        .map(|a| a.plan.success_probability)
        .collect();
    ScenarioMetrics {
        roi: outcome.roi,
        success_probability: crate::stats::descriptive::mean(&success),
        time_to_value: scenario.actions.iter().map(|a| a.plan.end()).min(),
        resource_need: sequence.resources.peak_demand,
        risk_score: risk.overall_score,
    }
}

fn compare_scenarios(results: &[ScenarioResult], expected_roi: f64) -> ScenarioComparison {
    let mut ranked: Vec<&ScenarioResult> = results.iter().collect();
    ranked.sort_by(|a, b| {
        b.outcome
            .roi
            .total_cmp(&a.outcome.roi)
            .then_with(|| a.scenario_id.cmp(&b.scenario_id))
    });
    let ranking: Vec<RankedScenario> = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| RankedScenario {
            rank: i + 1,
            scenario_id: r.scenario_id.clone(),
            probability: r.probability,
            roi: r.outcome.roi,
        })
        .collect();

    let probability_sum: f64 = results.iter().map(|r| r.probability).sum();
    ScenarioComparison {
        best_scenario: ranking.first().map(|r| r.scenario_id.clone()),
        worst_scenario: ranking.last().map(|r| r.scenario_id.clone()),
        ranking,
        expected_roi,
        probability_sum,
        probabilities_consistent: results.is_empty() || (probability_sum - 100.0).abs() <= 0.5,
    }
}

fn compare_factories(results: &[ScenarioResult], factories: &[Factory]) -> Vec<FactoryComparison> {
    // factory → (Σ p × improvement, Σ p, Σ improvement, scenario count, KPI ids)
    let mut acc: BTreeMap<String, (f64, f64, f64, usize, BTreeSet<String>)> = BTreeMap::new();

    for result in results {
        let mut per_factory: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for projection in &result.projections {
            if let Some(last) = projection.periods.last() {
                for f in &last.factories {
                    per_factory
                        .entry(f.factory_id.as_str())
                        .or_default()
                        .push(f.improvement_pct);
                    acc.entry(f.factory_id.clone())
                        .or_default()
                        .4
                        .insert(projection.kpi_id.clone());
                }
            }
        }
        for (factory_id, improvements) in per_factory {
            let improvement = crate::stats::descriptive::mean(&improvements);
            let entry = acc.entry(factory_id.to_string()).or_default();
            entry.0 += result.probability * improvement;
            entry.1 += result.probability;
            entry.2 += improvement;
            entry.3 += 1;
        }
    }

    let mut out: Vec<FactoryComparison> = acc
        .into_iter()
        .map(|(factory_id, (weighted, weight, plain, n, kpis))| {
            let weighted_improvement_pct = if weight > 0.0 {
                weighted / weight
            } else if n > 0 {
                plain / n as f64
            } else {
                0.0
            };
            let name = factories
                .iter()
                .find(|f| f.id == factory_id)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| factory_id.clone());
            FactoryComparison {
                rank: 0,
                factory_id,
                name,
                weighted_improvement_pct,
                kpis: kpis.len(),
            }
        })
        .collect();

    out.sort_by(|a, b| {
        b.weighted_improvement_pct
            .total_cmp(&a.weighted_improvement_pct)
            .then_with(|| a.factory_id.cmp(&b.factory_id))
    });
    for (i, f) in out.iter_mut().enumerate() {
        f.rank = i + 1;
    }
    out
}

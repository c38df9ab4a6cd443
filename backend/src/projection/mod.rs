//! Scenario-to-KPI projection
//!
//! For each future step `m` and each factory with history:
//!
//! ```text
//! trend_value = observed × (1 + trend_rate × m / step_size)
//! impact      = Σ over actions active at m:
//!                 observed × impact_score × completion/100 × success/100 × time_progress
//! projected   = trend_value + impact
//! ```
//!
//! Action impact is additive on top of the trended baseline and is computed
//! from the observed value, so it is never compounded with trend growth.
//! Factory results are then averaged into a per-period KPI projection whose
//! interval widens with the cross-factory dispersion of improvement %.

use crate::core::Period;
use crate::models::{DiagnosticKind, DiagnosticLog, Kpi, KpiSeries, PlannedAction, PreparedScenario};
use crate::profile::RiskLevel;
use crate::stats::descriptive::{mean, population_std_dev};
use crate::stats::TimeSeriesStatistics;
use serde::{Deserialize, Serialize};

/// Projection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Number of future steps to project
    pub horizon: u32,

    /// Projection steps per history period (trend rate is per history period)
    pub step_size: f64,

    /// Multiplier applied to improvement dispersion for the interval
    pub interval_z: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon: 4,
            step_size: 1.0,
            interval_z: 1.96,
        }
    }
}

/// Projected value of one KPI at one factory for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryProjection {
    pub factory_id: String,
    pub observed_value: f64,
    /// Baseline with trend, no action impact
    pub trend_value: f64,
    /// Sum of active action contributions
    pub action_impact: f64,
    pub projected_value: f64,
    /// (projected − observed) ÷ observed × 100; 0 when observed is 0
    pub improvement_pct: f64,
    pub improvement_defined: bool,
    /// Projected achievement against the KPI target, when usable
    pub achievement_rate: Option<f64>,
    /// Actions active at this step with a non-zero link to the KPI
    pub contributing_actions: Vec<String>,
    pub risk_level: RiskLevel,
}

/// Factory results aggregated for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodProjection {
    pub step: u32,
    pub period: Period,
    pub mean_observed: f64,
    pub mean_trend_value: f64,
    pub mean_projected: f64,
    pub mean_improvement_pct: f64,
    /// Population std dev of improvement % across factories
    pub improvement_dispersion: f64,
    pub lower: f64,
    pub upper: f64,
    pub factories: Vec<FactoryProjection>,
}

/// Projection of one KPI across the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiProjection {
    pub kpi_id: String,
    pub scenario_id: String,
    pub periods: Vec<PeriodProjection>,
}

/// Per-factory starting point derived from history
#[derive(Debug, Clone)]
struct FactoryBaseline {
    factory_id: String,
    last_period: Period,
    observed: f64,
    /// Relative growth per history period
    trend_rate: f64,
}

/// Stateless projector with injected configuration
#[derive(Debug, Clone, Default)]
pub struct ScenarioProjector {
    stats: TimeSeriesStatistics,
    config: ProjectionConfig,
}

impl ScenarioProjector {
    pub fn new(stats: TimeSeriesStatistics, config: ProjectionConfig) -> Self {
        Self { stats, config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project every KPI that has history under `scenario`
    ///
    /// KPIs without history are excluded, never given a synthetic baseline.
    pub fn project(
        &self,
        scenario: &PreparedScenario,
        kpis: &[Kpi],
        series: &[KpiSeries],
        log: &mut DiagnosticLog,
    ) -> Vec<KpiProjection> {
        let mut out = Vec::new();
        for kpi in kpis {
            let baselines = self.baselines_for(&kpi.id, series);
            if baselines.is_empty() {
                log.exclude(
                    format!("{}/{}", scenario.id(), kpi.id),
                    "no history to project from",
                );
                continue;
            }
            out.push(self.project_kpi(scenario, kpi, &baselines, log));
        }
        tracing::debug!(
            scenario = %scenario.id(),
            kpis = out.len(),
            "scenario projected"
        );
        out
    }

    fn baselines_for(&self, kpi_id: &str, series: &[KpiSeries]) -> Vec<FactoryBaseline> {
        let mut baselines: Vec<FactoryBaseline> = series
            .iter()
            .filter(|s| s.kpi_id == kpi_id)
            .filter_map(|s| {
                let observations = s.sorted();
                let latest = observations.last()?;
                let trend = self.stats.analyze_trend(&observations);
                let trend_rate = if latest.value.abs() > f64::EPSILON {
                    trend.slope / latest.value
                } else {
                    0.0
                };
                Some(FactoryBaseline {
                    factory_id: s.factory_id.clone(),
                    last_period: latest.period,
                    observed: latest.value,
                    trend_rate,
                })
            })
            .collect();
        baselines.sort_by(|a, b| a.factory_id.cmp(&b.factory_id));
        baselines
    }

    fn project_kpi(
        &self,
        scenario: &PreparedScenario,
        kpi: &Kpi,
        baselines: &[FactoryBaseline],
        log: &mut DiagnosticLog,
    ) -> KpiProjection {
        let linked: Vec<&PlannedAction> = scenario
            .actions
            .iter()
            .filter(|a| a.action.impact_on(&kpi.id) != 0.0)
            .collect();

        let anchor = baselines
            .iter()
            .map(|b| b.last_period)
            .max()
            .unwrap_or_else(|| Period::from_ordinal(0));

        for b in baselines.iter().filter(|b| b.observed.abs() <= f64::EPSILON) {
            log.record(
                DiagnosticKind::ZeroBaseline,
                format!("{}/{}/{}", scenario.id(), kpi.id, b.factory_id),
                "observed value is 0; improvement % reported as 0",
            );
        }

        let step_size = if self.config.step_size > 0.0 {
            self.config.step_size
        } else {
            1.0
        };

        let periods = (1..=self.config.horizon)
            .map(|m| {
                let factories: Vec<FactoryProjection> = baselines
                    .iter()
                    .map(|b| self.project_factory(kpi, b, &linked, m, step_size))
                    .collect();
                self.aggregate(m, anchor.advance(m as i64), factories)
            })
            .collect();

        KpiProjection {
            kpi_id: kpi.id.clone(),
            scenario_id: scenario.id().to_string(),
            periods,
        }
    }

    fn project_factory(
        &self,
        kpi: &Kpi,
        baseline: &FactoryBaseline,
        linked: &[&PlannedAction],
        m: u32,
        step_size: f64,
    ) -> FactoryProjection {
        let observed = baseline.observed;
        let trend_value = observed * (1.0 + baseline.trend_rate * m as f64 / step_size);

        let mut action_impact = 0.0;
        let mut contributing = Vec::new();
        for planned in linked.iter().filter(|a| a.plan.is_active_at(m)) {
            let plan = &planned.plan;
            action_impact += observed
                * planned.action.impact_on(&kpi.id)
                * (plan.completion_rate / 100.0)
                * (plan.success_probability / 100.0)
                * plan.time_progress(m);
            contributing.push(plan.action_id.clone());
        }

        let projected_value = trend_value + action_impact;
        let improvement_defined = observed.abs() > f64::EPSILON;
        let improvement_pct = if improvement_defined {
            (projected_value - observed) / observed.abs() * 100.0
        } else {
            0.0
        };

        let target = kpi.valid_target();
        FactoryProjection {
            factory_id: baseline.factory_id.clone(),
            observed_value: observed,
            trend_value,
            action_impact,
            projected_value,
            improvement_pct,
            improvement_defined,
            achievement_rate: target.map(|t| projected_value / t * 100.0),
            contributing_actions: contributing,
            risk_level: factory_risk(observed, target, linked),
        }
    }

    fn aggregate(&self, m: u32, period: Period, factories: Vec<FactoryProjection>) -> PeriodProjection {
        let observed: Vec<f64> = factories.iter().map(|f| f.observed_value).collect();
        let trend: Vec<f64> = factories.iter().map(|f| f.trend_value).collect();
        let projected: Vec<f64> = factories.iter().map(|f| f.projected_value).collect();
        let improvements: Vec<f64> = factories.iter().map(|f| f.improvement_pct).collect();

        let mean_projected = mean(&projected);
        let dispersion = population_std_dev(&improvements);
        let half_width = mean_projected.abs() * self.config.interval_z * dispersion / 100.0;

        PeriodProjection {
            step: m,
            period,
            mean_observed: mean(&observed),
            mean_trend_value: mean(&trend),
            mean_projected,
            mean_improvement_pct: mean(&improvements),
            improvement_dispersion: dispersion,
            lower: mean_projected - half_width,
            upper: mean_projected + half_width,
            factories,
        }
    }
}

/// Risk from achievement shortfall, action coverage and resource intensity
///
/// No linked action adds the most risk; exactly one is a single point of
/// failure.
fn factory_risk(observed: f64, target: Option<f64>, linked: &[&PlannedAction]) -> RiskLevel {
    let mut points = 0;

    if let Some(t) = target {
        let shortfall = 100.0 - (observed / t * 100.0).clamp(0.0, 100.0);
        if shortfall > 30.0 {
            points += 2;
        } else if shortfall > 10.0 {
            points += 1;
        }
    }

    match linked.len() {
        0 => points += 2,
        1 => points += 1,
        _ => {}
    }

    if !linked.is_empty() {
        let intensity = mean(
            &linked
                .iter()
                .map(|a| a.plan.resource_requirement)
                .collect::<Vec<_>>(),
        );
        if intensity > 70.0 {
            points += 2;
        } else if intensity > 40.0 {
            points += 1;
        }
    }

    if points >= 4 {
        RiskLevel::High
    } else if points >= 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

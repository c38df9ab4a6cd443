//! Per-KPI, per-factory performance profiles
//!
//! Combines the time-series analyses with target achievement, a benchmark
//! position among factories reporting the same KPI, descriptive tags and
//! generated recommendations.

use crate::core::Period;
use crate::models::{DiagnosticKind, DiagnosticLog, Kpi, KpiSeries};
use crate::stats::{
    AnomalyResult, ForecastResult, SeasonalityResult, SeriesHealth, Severity,
    TimeSeriesStatistics, TrendDirection, TrendResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Percentile at or above which a factory is a top performer
const TOP_PERFORMER_PERCENTILE: f64 = 75.0;

/// Percentile at or below which a factory is a bottom performer
const BOTTOM_PERFORMER_PERCENTILE: f64 = 25.0;

/// How to treat a KPI whose target is missing or non-positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "value", rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Leave achievement undefined and record a diagnostic
    Skip,
    /// Use the given target and record a diagnostic
    SubstituteDefault(f64),
    /// Fail the request
    Raise,
}

/// Errors raised while profiling
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("KPI {kpi_id} has no usable target")]
    InvalidTarget { kpi_id: String },
}

/// Coarse risk label used by profiles and projections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Profile configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Lower clamp for achievement rates
    pub achievement_min: f64,
    /// Upper clamp for achievement rates
    pub achievement_max: f64,
    pub target_policy: TargetPolicy,
    /// Achievement (%) at which a KPI counts as on track
    pub on_track_threshold: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            achievement_min: 0.0,
            achievement_max: 100.0,
            target_policy: TargetPolicy::Skip,
            on_track_threshold: 90.0,
        }
    }
}

/// Everything known about one KPI at one factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub kpi_id: String,
    pub factory_id: String,
    pub current_period: Option<Period>,
    pub current_value: f64,
    pub target: Option<f64>,
    /// value ÷ target × 100, clamped; None when the target is unusable
    pub achievement_rate: Option<f64>,
    pub trend: TrendResult,
    pub seasonality: SeasonalityResult,
    pub anomalies: AnomalyResult,
    pub forecast: ForecastResult,
    /// Percentile rank of the current value among factories (0-100)
    pub benchmark_percentile: f64,
    pub tags: Vec<String>,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

/// Stateless profile builder with injected configuration
#[derive(Debug, Clone, Default)]
pub struct PerformanceProfileBuilder {
    stats: TimeSeriesStatistics,
    config: ProfileConfig,
}

impl PerformanceProfileBuilder {
    pub fn new(stats: TimeSeriesStatistics, config: ProfileConfig) -> Self {
        Self { stats, config }
    }

    /// value ÷ target × 100 clamped to the configured range
    ///
    /// # Example
    /// ```
    /// use kpi_forecast_core_rs::profile::PerformanceProfileBuilder;
    ///
    /// let builder = PerformanceProfileBuilder::default();
    /// let rate = builder.achievement_rate(130.0, 150.0);
    /// assert!((rate - 86.6667).abs() < 1e-3);
    /// assert_eq!(builder.achievement_rate(200.0, 150.0), 100.0);
    /// ```
    pub fn achievement_rate(&self, value: f64, target: f64) -> f64 {
        if target <= 0.0 || !target.is_finite() {
            return self.config.achievement_min;
        }
        (value / target * 100.0).clamp(self.config.achievement_min, self.config.achievement_max)
    }

    /// Apply the target policy to a KPI
    pub fn resolve_target(
        &self,
        kpi: &Kpi,
        log: &mut DiagnosticLog,
    ) -> Result<Option<f64>, ProfileError> {
        if let Some(target) = kpi.valid_target() {
            return Ok(Some(target));
        }
        match self.config.target_policy {
            TargetPolicy::Skip => {
                log.record(
                    DiagnosticKind::InvalidTarget,
                    &kpi.id,
                    "missing or non-positive target; achievement left undefined",
                );
                Ok(None)
            }
            TargetPolicy::SubstituteDefault(value) => {
                log.record(
                    DiagnosticKind::InvalidTarget,
                    &kpi.id,
                    format!("missing or non-positive target; substituted {value}"),
                );
                Ok(Some(value).filter(|v| *v > 0.0))
            }
            TargetPolicy::Raise => Err(ProfileError::InvalidTarget {
                kpi_id: kpi.id.clone(),
            }),
        }
    }

    /// Profiles for every factory reporting `kpi`
    ///
    /// A KPI with no history is excluded (never given a synthetic series).
    pub fn build(
        &self,
        kpi: &Kpi,
        series: &[KpiSeries],
        log: &mut DiagnosticLog,
    ) -> Result<Vec<PerformanceProfile>, ProfileError> {
        let own: Vec<&KpiSeries> = series
            .iter()
            .filter(|s| s.kpi_id == kpi.id && !s.sorted().is_empty())
            .collect();
        if own.is_empty() {
            log.exclude(&kpi.id, "no observation history");
            return Ok(Vec::new());
        }

        let target = self.resolve_target(kpi, log)?;

        let current_values: Vec<f64> = own
            .iter()
            .filter_map(|s| s.latest().map(|o| o.value))
            .collect();

        let mut profiles = Vec::with_capacity(own.len());
        for s in own {
            let observations = s.sorted();
            let latest = s.latest();
            let current_value = latest.map(|o| o.value).unwrap_or(0.0);

            if observations.len() < crate::stats::MIN_TREND_POINTS {
                log.record(
                    DiagnosticKind::InsufficientData,
                    format!("{}/{}", kpi.id, s.factory_id),
                    format!(
                        "{} observation(s); trend and forecast are neutral",
                        observations.len()
                    ),
                );
            }

            let trend = self.stats.analyze_trend(&observations);
            let seasonality = self.stats.detect_seasonality(&observations);
            let anomalies = self.stats.detect_anomalies(&observations);
            let forecast = self.stats.generate_forecast(&observations);
            let achievement_rate = target.map(|t| self.achievement_rate(current_value, t));
            let benchmark_percentile =
                crate::stats::descriptive::percentile_rank(current_value, &current_values);

            let mut profile = PerformanceProfile {
                kpi_id: kpi.id.clone(),
                factory_id: s.factory_id.clone(),
                current_period: latest.map(|o| o.period),
                current_value,
                target,
                achievement_rate,
                trend,
                seasonality,
                anomalies,
                forecast,
                benchmark_percentile,
                tags: Vec::new(),
                risk_level: RiskLevel::Low,
                recommendations: Vec::new(),
            };
            profile.tags = self.tags_for(&profile, current_values.len());
            profile.risk_level = self.risk_for(&profile);
            profile.recommendations = self.recommendations_for(&profile);

            tracing::debug!(
                kpi = %profile.kpi_id,
                factory = %profile.factory_id,
                risk = ?profile.risk_level,
                "profile built"
            );
            profiles.push(profile);
        }
        Ok(profiles)
    }

    fn tags_for(&self, p: &PerformanceProfile, peers: usize) -> Vec<String> {
        let mut tags = Vec::new();
        if let Some(rate) = p.achievement_rate {
            if rate >= self.config.on_track_threshold {
                tags.push("on-track");
            } else {
                tags.push("at-risk");
            }
        }
        match p.trend.direction {
            TrendDirection::Increasing => tags.push("improving"),
            TrendDirection::Decreasing => tags.push("declining"),
            TrendDirection::Volatile => tags.push("volatile"),
            TrendDirection::Stable => {}
        }
        if p.seasonality.detected {
            tags.push("seasonal");
        }
        if !p.anomalies.anomalies.is_empty() {
            tags.push("anomalous");
        }
        if peers >= 2 {
            if p.benchmark_percentile >= TOP_PERFORMER_PERCENTILE {
                tags.push("top-performer");
            } else if p.benchmark_percentile <= BOTTOM_PERFORMER_PERCENTILE {
                tags.push("bottom-performer");
            }
        }
        tags.into_iter().map(String::from).collect()
    }

    fn risk_for(&self, p: &PerformanceProfile) -> RiskLevel {
        let mut points = 0;
        match p.achievement_rate {
            Some(rate) if rate < 70.0 => points += 2,
            Some(rate) if rate < self.config.on_track_threshold => points += 1,
            _ => {}
        }
        match p.trend.direction {
            TrendDirection::Decreasing | TrendDirection::Volatile => points += 1,
            _ => {}
        }
        match p.anomalies.health {
            SeriesHealth::Critical => points += 2,
            SeriesHealth::Concerning => points += 1,
            SeriesHealth::Healthy => {}
        }
        if points >= 3 {
            RiskLevel::High
        } else if points >= 1 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn recommendations_for(&self, p: &PerformanceProfile) -> Vec<String> {
        let mut out = Vec::new();

        if !p.trend.sufficient_data {
            out.push(format!(
                "Collect at least {} periods of history for {} to enable trend analysis",
                crate::stats::MIN_TREND_POINTS,
                p.kpi_id
            ));
        }

        if let (Some(rate), Some(target)) = (p.achievement_rate, p.target) {
            if rate < self.config.on_track_threshold {
                let reaching = p.forecast.points.iter().find(|f| f.value >= target);
                match reaching {
                    Some(point) => out.push(format!(
                        "Forecast reaches target {target} by {}; protect the current trajectory",
                        point.period
                    )),
                    None => out.push(format!(
                        "Current trajectory does not reach target {target}; prioritise actions linked to {}",
                        p.kpi_id
                    )),
                }
            }
        }

        match p.trend.direction {
            TrendDirection::Decreasing => {
                out.push("Investigate the drivers of the declining trend".to_string())
            }
            TrendDirection::Volatile => out.push(
                "Stabilise the underlying process before scaling improvement actions".to_string(),
            ),
            _ => {}
        }

        if let Some(worst) = p
            .anomalies
            .anomalies
            .iter()
            .filter(|a| a.severity >= Severity::High)
            .max_by(|a, b| a.z_score.abs().total_cmp(&b.z_score.abs()))
        {
            out.push(format!(
                "Review the {:?} anomaly recorded in {} (z = {:.2})",
                worst.severity, worst.period, worst.z_score
            ));
        }

        if p.seasonality.detected {
            if let Some(low) = p
                .seasonality
                .quarters
                .iter()
                .min_by(|a, b| a.seasonal_index.total_cmp(&b.seasonal_index))
            {
                out.push(format!(
                    "Schedule interventions around the seasonal low in Q{}",
                    low.quarter
                ));
            }
        }

        out
    }
}

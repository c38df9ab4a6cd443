//! Z-score anomaly detection

use super::descriptive::{mean, population_std_dev};
use super::{sorted_observations, TimeSeriesStatistics, MIN_ANOMALY_POINTS};
use crate::core::Period;
use crate::models::Observation;
use serde::{Deserialize, Serialize};

/// Repeated spikes/drops before a pattern is flagged
const PATTERN_REPEAT_COUNT: usize = 3;

/// Anomaly share above which the series is flagged as erratic
const HIGH_ANOMALY_RATIO: f64 = 0.30;

/// Four-step severity scale shared by anomalies and risk factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Band on |z|: >4 critical, >3.5 high, >3 medium, else low
    pub fn from_z_score(z: f64) -> Self {
        let z = z.abs();
        if z > 4.0 {
            Severity::Critical
        } else if z > 3.5 {
            Severity::High
        } else if z > 3.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Shape of an anomalous point relative to the 2σ envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Spike,
    Drop,
    Outlier,
}

/// Overall verdict on a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesHealth {
    Healthy,
    Concerning,
    Critical,
}

/// Recurring anomaly patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyPattern {
    FrequentSpikes,
    FrequentDrops,
    HighAnomalyRatio,
}

/// A single flagged observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub period: Period,
    pub value: f64,
    pub z_score: f64,
    pub severity: Severity,
    pub kind: AnomalyKind,
}

/// Outcome of anomaly detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub anomalies: Vec<Anomaly>,
    pub mean: f64,
    pub std_dev: f64,
    /// Flagged points ÷ total points
    pub anomaly_ratio: f64,
    pub health: SeriesHealth,
    pub patterns: Vec<AnomalyPattern>,
    pub sufficient_data: bool,
}

impl AnomalyResult {
    pub fn insufficient() -> Self {
        Self {
            anomalies: Vec::new(),
            mean: 0.0,
            std_dev: 0.0,
            anomaly_ratio: 0.0,
            health: SeriesHealth::Healthy,
            patterns: Vec::new(),
            sufficient_data: false,
        }
    }

    pub fn count_of(&self, kind: AnomalyKind) -> usize {
        self.anomalies.iter().filter(|a| a.kind == kind).count()
    }
}

impl TimeSeriesStatistics {
    /// Flag observations whose population z-score exceeds the threshold
    ///
    /// Needs five points. A series with zero spread has no anomalies.
    pub fn detect_anomalies(&self, observations: &[Observation]) -> AnomalyResult {
        let obs = sorted_observations(observations);
        if obs.len() < MIN_ANOMALY_POINTS {
            return AnomalyResult::insufficient();
        }

        let values: Vec<f64> = obs.iter().map(|o| o.value).collect();
        let mu = mean(&values);
        let sigma = population_std_dev(&values);

        let mut anomalies = Vec::new();
        if sigma > f64::EPSILON {
            for o in &obs {
                let z = (o.value - mu) / sigma;
                if z.abs() <= self.config.anomaly_z_threshold {
                    continue;
                }
                let kind = if o.value > mu + 2.0 * sigma {
                    AnomalyKind::Spike
                } else if o.value < mu - 2.0 * sigma {
                    AnomalyKind::Drop
                } else {
                    AnomalyKind::Outlier
                };
                anomalies.push(Anomaly {
                    period: o.period,
                    value: o.value,
                    z_score: z,
                    severity: Severity::from_z_score(z),
                    kind,
                });
            }
        }

        let critical = anomalies
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .count();
        let high = anomalies
            .iter()
            .filter(|a| a.severity == Severity::High)
            .count();
        let health = if critical > 0 {
            SeriesHealth::Critical
        } else if high > 1 {
            SeriesHealth::Concerning
        } else {
            SeriesHealth::Healthy
        };

        let anomaly_ratio = anomalies.len() as f64 / obs.len() as f64;
        let mut result = AnomalyResult {
            anomalies,
            mean: mu,
            std_dev: sigma,
            anomaly_ratio,
            health,
            patterns: Vec::new(),
            sufficient_data: true,
        };

        if result.count_of(AnomalyKind::Spike) >= PATTERN_REPEAT_COUNT {
            result.patterns.push(AnomalyPattern::FrequentSpikes);
        }
        if result.count_of(AnomalyKind::Drop) >= PATTERN_REPEAT_COUNT {
            result.patterns.push(AnomalyPattern::FrequentDrops);
        }
        if anomaly_ratio > HIGH_ANOMALY_RATIO {
            result.patterns.push(AnomalyPattern::HighAnomalyRatio);
        }

        result
    }
}

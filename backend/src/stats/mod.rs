//! Time-series statistics over quarter-labelled observations
//!
//! Fixed methods only:
//! - **trend**: ordinary least squares on the observation index
//! - **seasonality**: per-quarter deviation from the grand mean
//! - **anomaly**: population z-scores
//! - **correlation**: pairwise Pearson over common periods + greedy clustering
//! - **forecast**: linear extrapolation with a Gaussian band
//!
//! Every analysis sorts its input by period first and degrades to a neutral,
//! zero-confidence result when the series is too short. Nothing here returns
//! an error.

pub mod anomaly;
pub mod correlation;
pub mod descriptive;
pub mod forecast;
pub mod seasonality;
pub mod trend;

pub use anomaly::{Anomaly, AnomalyKind, AnomalyPattern, AnomalyResult, SeriesHealth, Severity};
pub use correlation::{
    CorrelationDirection, CorrelationPair, CorrelationResult, CorrelationStrength,
};
pub use forecast::{ForecastPoint, ForecastResult};
pub use seasonality::{QuarterProfile, SeasonalityResult};
pub use trend::{TrendDirection, TrendResult, TrendStrength};

use serde::{Deserialize, Serialize};

/// Minimum points for a trend fit
pub const MIN_TREND_POINTS: usize = 3;

/// Minimum points for anomaly detection
pub const MIN_ANOMALY_POINTS: usize = 5;

/// Minimum points for seasonality detection
pub const MIN_SEASONALITY_POINTS: usize = 8;

/// Minimum common periods for a correlation pair
pub const MIN_CORRELATION_PERIODS: usize = 3;

/// Thresholds for the time-series analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// |slope| below this is "stable"
    pub stable_slope_threshold: f64,

    /// Mean |period-over-period change| above this share of the mean is "volatile"
    pub volatility_ratio: f64,

    /// |z| above this flags an anomaly
    pub anomaly_z_threshold: f64,

    /// Mean relative quarter deviation above this is "seasonal"
    pub seasonality_threshold: f64,

    /// Number of future periods to forecast
    pub forecast_horizon: usize,

    /// Gaussian multiplier for the forecast band (1.96 = 95%)
    pub interval_z: f64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            stable_slope_threshold: 0.1,
            volatility_ratio: 0.30,
            anomaly_z_threshold: 2.5,
            seasonality_threshold: 0.10,
            forecast_horizon: 4,
            interval_z: 1.96,
        }
    }
}

/// Stateless analysis service with injected thresholds
///
/// # Example
/// ```
/// use kpi_forecast_core_rs::models::Observation;
/// use kpi_forecast_core_rs::stats::{TimeSeriesStatistics, TrendDirection};
///
/// let stats = TimeSeriesStatistics::default();
/// let obs: Vec<Observation> = [(1, 100.0), (2, 110.0), (3, 120.0), (4, 130.0)]
///     .iter()
///     .map(|(q, v)| Observation::new(kpi_forecast_core_rs::Period::new(2024, *q).unwrap(), *v))
///     .collect();
///
/// let trend = stats.analyze_trend(&obs);
/// assert_eq!(trend.direction, TrendDirection::Increasing);
/// assert!((trend.slope - 10.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStatistics {
    config: StatisticsConfig,
}

impl TimeSeriesStatistics {
    pub fn new(config: StatisticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatisticsConfig {
        &self.config
    }
}

/// Chronologically sorted copy with non-finite values removed
pub(crate) fn sorted_observations(
    observations: &[crate::models::Observation],
) -> Vec<crate::models::Observation> {
    let mut obs: Vec<_> = observations
        .iter()
        .copied()
        .filter(|o| o.value.is_finite())
        .collect();
    obs.sort_by_key(|o| o.period);
    obs
}

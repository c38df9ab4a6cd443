//! Linear-regression trend analysis

use super::descriptive::{linear_regression, mean};
use super::{sorted_observations, TimeSeriesStatistics, MIN_TREND_POINTS};
use crate::models::kpi::values_of;
use crate::models::Observation;
use serde::{Deserialize, Serialize};

/// Direction label of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    /// Period-over-period swings dominate the slope
    Volatile,
}

/// Strength label derived from R²
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    Strong,
    Moderate,
    Weak,
}

impl TrendStrength {
    fn from_r_squared(r_squared: f64) -> Self {
        if r_squared > 0.7 {
            TrendStrength::Strong
        } else if r_squared > 0.3 {
            TrendStrength::Moderate
        } else {
            TrendStrength::Weak
        }
    }
}

/// Outcome of a trend fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Change per period
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Fitted value one period past the last observation
    pub projected_next: f64,
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    /// R² × 100, clamped to [0, 100]
    pub confidence: f64,
    /// Mean |period-over-period change| relative to the mean value
    pub volatility: f64,
    pub sample_size: usize,
    /// False when the series was too short and this is the neutral result
    pub sufficient_data: bool,
}

impl TrendResult {
    /// Neutral result for short series: flat, zero confidence, pinned to the
    /// last value (0.0 for an empty series).
    pub fn insufficient(values: &[f64]) -> Self {
        let last = values.last().copied().unwrap_or(0.0);
        Self {
            slope: 0.0,
            intercept: last,
            r_squared: 0.0,
            projected_next: last,
            direction: TrendDirection::Stable,
            strength: TrendStrength::Weak,
            confidence: 0.0,
            volatility: 0.0,
            sample_size: values.len(),
            sufficient_data: false,
        }
    }
}

impl TimeSeriesStatistics {
    /// Fit a least-squares trend (x = observation index)
    ///
    /// Needs at least three points. The slope-based direction is overridden
    /// with `Volatile` when the mean absolute period-over-period change
    /// exceeds `volatility_ratio` of the mean value.
    pub fn analyze_trend(&self, observations: &[Observation]) -> TrendResult {
        let values = values_of(&sorted_observations(observations));
        self.trend_of_values(&values)
    }

    /// Trend of values already in chronological order
    pub fn trend_of_values(&self, values: &[f64]) -> TrendResult {
        if values.len() < MIN_TREND_POINTS {
            return TrendResult::insufficient(values);
        }
        let fit = match linear_regression(values) {
            Some(fit) => fit,
            None => return TrendResult::insufficient(values),
        };

        let mean_value = mean(values);
        let mean_abs_change = mean(
            &values
                .windows(2)
                .map(|w| (w[1] - w[0]).abs())
                .collect::<Vec<_>>(),
        );
        let volatility = if mean_value.abs() > f64::EPSILON {
            mean_abs_change / mean_value.abs()
        } else if mean_abs_change > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let direction = if volatility > self.config.volatility_ratio {
            TrendDirection::Volatile
        } else if fit.slope.abs() < self.config.stable_slope_threshold {
            TrendDirection::Stable
        } else if fit.slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        };

        TrendResult {
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            projected_next: fit.at(values.len() as f64),
            direction,
            strength: TrendStrength::from_r_squared(fit.r_squared),
            confidence: (fit.r_squared * 100.0).clamp(0.0, 100.0),
            volatility: if volatility.is_finite() { volatility } else { 1.0 },
            sample_size: values.len(),
            sufficient_data: true,
        }
    }
}

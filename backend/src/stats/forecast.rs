//! Short-horizon linear-extrapolation forecast

use super::descriptive::sample_std_dev;
use super::{sorted_observations, TimeSeriesStatistics, MIN_TREND_POINTS};
use crate::core::Period;
use crate::models::Observation;
use serde::{Deserialize, Serialize};

/// One forecast period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: Period,
    /// Steps past the last observation (1-based)
    pub step: usize,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Forecast with a fixed-width Gaussian band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub points: Vec<ForecastPoint>,
    /// Band half-width (interval_z × sample std dev of the history)
    pub half_width: f64,
    /// Trend confidence (0-100)
    pub confidence: f64,
    /// confidence / 100 clamped to [0.1, 0.9]
    pub probability: f64,
    pub sufficient_data: bool,
}

impl TimeSeriesStatistics {
    /// Extrapolate `last value + slope × step` for each future period
    ///
    /// Needs three points; shorter series are pinned flat to their last value
    /// with zero confidence. An empty series yields no points.
    pub fn generate_forecast(&self, observations: &[Observation]) -> ForecastResult {
        self.generate_forecast_with_horizon(observations, self.config.forecast_horizon)
    }

    pub fn generate_forecast_with_horizon(
        &self,
        observations: &[Observation],
        horizon: usize,
    ) -> ForecastResult {
        let obs = sorted_observations(observations);
        let values: Vec<f64> = obs.iter().map(|o| o.value).collect();
        let trend = self.trend_of_values(&values);

        let last = match obs.last() {
            Some(last) => *last,
            None => {
                return ForecastResult {
                    points: Vec::new(),
                    half_width: 0.0,
                    confidence: 0.0,
                    probability: probability_from_confidence(0.0),
                    sufficient_data: false,
                }
            }
        };

        let sufficient = values.len() >= MIN_TREND_POINTS;
        let half_width = if sufficient {
            self.config.interval_z * sample_std_dev(&values)
        } else {
            0.0
        };

        let points = (1..=horizon)
            .map(|step| {
                let value = last.value + trend.slope * step as f64;
                ForecastPoint {
                    period: last.period.advance(step as i64),
                    step,
                    value,
                    lower: value - half_width,
                    upper: value + half_width,
                }
            })
            .collect();

        ForecastResult {
            points,
            half_width,
            confidence: trend.confidence,
            probability: probability_from_confidence(trend.confidence),
            sufficient_data: sufficient,
        }
    }
}

fn probability_from_confidence(confidence: f64) -> f64 {
    (confidence / 100.0).clamp(0.1, 0.9)
}

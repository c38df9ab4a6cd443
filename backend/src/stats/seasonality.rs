//! Quarterly seasonality detection

use super::descriptive::mean;
use super::{sorted_observations, TimeSeriesStatistics, MIN_SEASONALITY_POINTS};
use crate::core::Period;
use crate::models::Observation;
use serde::{Deserialize, Serialize};

/// Minimum samples per quarter for the quarter to count
const MIN_SAMPLES_PER_QUARTER: usize = 2;

/// Aggregate of all observations falling in one calendar quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterProfile {
    /// Quarter (1-4)
    pub quarter: u8,
    pub samples: usize,
    pub mean: f64,
    /// Quarter mean ÷ grand mean (1.0 = no seasonal effect)
    pub seasonal_index: f64,
}

/// Outcome of seasonality detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityResult {
    pub detected: bool,
    /// Mean relative deviation of quarter means from the grand mean
    pub strength: f64,
    pub confidence: f64,
    pub quarters: Vec<QuarterProfile>,
    /// Periods that are 3-point local maxima
    pub peaks: Vec<Period>,
    /// Periods that are 3-point local minima
    pub troughs: Vec<Period>,
    pub sufficient_data: bool,
}

impl SeasonalityResult {
    pub fn insufficient() -> Self {
        Self {
            detected: false,
            strength: 0.0,
            confidence: 0.0,
            quarters: Vec::new(),
            peaks: Vec::new(),
            troughs: Vec::new(),
            sufficient_data: false,
        }
    }
}

impl TimeSeriesStatistics {
    /// Detect a quarterly pattern
    ///
    /// Needs eight points. Seasonality is reported only when all four quarters
    /// carry at least two samples and the mean relative deviation of quarter
    /// means from the grand mean exceeds `seasonality_threshold`. Peaks and
    /// troughs are listed whether or not the pattern is detected.
    pub fn detect_seasonality(&self, observations: &[Observation]) -> SeasonalityResult {
        let obs = sorted_observations(observations);
        if obs.len() < MIN_SEASONALITY_POINTS {
            return SeasonalityResult::insufficient();
        }

        let values: Vec<f64> = obs.iter().map(|o| o.value).collect();
        let grand_mean = mean(&values);

        let mut buckets: [Vec<f64>; 4] = Default::default();
        for o in &obs {
            buckets[(o.period.quarter() - 1) as usize].push(o.value);
        }

        let quarters: Vec<QuarterProfile> = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_empty())
            .map(|(i, b)| {
                let q_mean = mean(b);
                QuarterProfile {
                    quarter: i as u8 + 1,
                    samples: b.len(),
                    mean: q_mean,
                    seasonal_index: if grand_mean.abs() > f64::EPSILON {
                        q_mean / grand_mean
                    } else {
                        1.0
                    },
                }
            })
            .collect();

        let covered = quarters
            .iter()
            .filter(|q| q.samples >= MIN_SAMPLES_PER_QUARTER)
            .count();

        let strength = if grand_mean.abs() > f64::EPSILON {
            mean(
                &quarters
                    .iter()
                    .map(|q| (q.mean - grand_mean).abs() / grand_mean.abs())
                    .collect::<Vec<_>>(),
            )
        } else {
            0.0
        };

        let threshold = self.config.seasonality_threshold;
        let detected = covered == 4 && strength > threshold;

        // Heuristic: quarter coverage scaled by how far past the threshold we are
        let confidence = if detected {
            let margin = (strength / (2.0 * threshold)).min(1.0);
            (covered as f64 / 4.0 * margin * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        let (peaks, troughs) = local_extrema(&obs);

        SeasonalityResult {
            detected,
            strength,
            confidence,
            quarters,
            peaks,
            troughs,
            sufficient_data: true,
        }
    }
}

fn local_extrema(obs: &[Observation]) -> (Vec<Period>, Vec<Period>) {
    let mut peaks = Vec::new();
    let mut troughs = Vec::new();
    for w in obs.windows(3) {
        let (prev, cur, next) = (w[0].value, w[1].value, w[2].value);
        if cur > prev && cur > next {
            peaks.push(w[1].period);
        } else if cur < prev && cur < next {
            troughs.push(w[1].period);
        }
    }
    (peaks, troughs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<Observation> {
        let start = Period::new(2022, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(start.advance(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_short_series_is_neutral() {
        let stats = TimeSeriesStatistics::default();
        let result = stats.detect_seasonality(&series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]));
        assert!(!result.sufficient_data);
        assert!(!result.detected);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_strong_quarterly_pattern_detected() {
        let stats = TimeSeriesStatistics::default();
        let result = stats.detect_seasonality(&series(&[
            80.0, 100.0, 140.0, 80.0, 82.0, 101.0, 138.0, 79.0,
        ]));
        assert!(result.detected);
        assert_eq!(result.quarters.len(), 4);
        assert!(result.confidence > 0.0);
        let q3 = result.quarters.iter().find(|q| q.quarter == 3).unwrap();
        assert!(q3.seasonal_index > 1.2);
        assert!(result.peaks.contains(&Period::new(2022, 3).unwrap()));
    }

    #[test]
    fn test_flat_series_not_seasonal_but_reports_extrema() {
        let stats = TimeSeriesStatistics::default();
        let result = stats.detect_seasonality(&series(&[
            100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0,
        ]));
        assert!(!result.detected);
        assert!(!result.peaks.is_empty());
        assert!(!result.troughs.is_empty());
    }

    #[test]
    fn test_missing_quarter_coverage_blocks_detection() {
        let stats = TimeSeriesStatistics::default();
        // Q1 and Q3 only (every other quarter)
        let start = Period::new(2020, 1).unwrap();
        let obs: Vec<Observation> = [50.0, 150.0, 50.0, 150.0, 50.0, 150.0, 50.0, 150.0]
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(start.advance(2 * i as i64), *v))
            .collect();
        let result = stats.detect_seasonality(&obs);
        assert!(result.sufficient_data);
        assert!(!result.detected);
    }
}

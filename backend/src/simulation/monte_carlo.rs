//! Seeded Monte Carlo over portfolio ROI
//!
//! Each iteration draws one `u ∈ [−v/100, +v/100]`, scales every action's
//! completion rate by `1 + u` and success probability by `1 + u/2`, and
//! records the probability-weighted portfolio ROI.
//!
//! # Determinism
//!
//! Iterations are split into fixed-size batches. Batch `b` draws from
//! `RngManager::derive(seed, b)`, and samples are concatenated in batch order
//! after every batch has finished. The result therefore depends only on the
//! seed, the inputs and the batch size, never on thread scheduling.

use crate::models::{DiagnosticKind, DiagnosticLog, PreparedScenario};
use crate::rng::RngManager;
use crate::simulation::evaluator::{OutcomeEvaluator, Perturbation};
use crate::stats::descriptive::{mean, median_of_sorted, population_std_dev};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Monte Carlo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub iterations: usize,

    /// Half-width of the uniform perturbation, in percent
    pub variability_pct: f64,

    /// Two-tailed interval levels in (0, 1)
    pub confidence_levels: Vec<f64>,

    /// Fixed seed; `None` draws one and reports it
    pub seed: Option<u64>,

    /// Iterations per batch (also the cancellation granularity)
    pub batch_size: usize,

    /// Requested iterations above this are reduced to it
    pub max_iterations: usize,

    pub histogram_bins: usize,

    /// Evaluate batches on the rayon pool
    pub parallel: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            variability_pct: 20.0,
            confidence_levels: vec![0.90, 0.95],
            seed: None,
            batch_size: 256,
            max_iterations: 100_000,
            histogram_bins: 20,
            parallel: true,
        }
    }
}

/// Errors from a Monte Carlo run
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonteCarloError {
    #[error("iteration count must be positive")]
    NoIterations,

    #[error("run cancelled after {completed_iterations} iterations")]
    Cancelled { completed_iterations: usize },
}

/// Cooperative cancellation flag, checked before every batch
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One equal-width histogram bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Empirical two-tailed percentile interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Distribution summary of portfolio ROI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Seed actually used (drawn when none was configured)
    pub seed: u64,
    pub iterations: usize,
    pub variability_pct: f64,
    /// ROI with no perturbation
    pub baseline_roi: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Share of iterations with ROI > 0
    pub probability_positive: f64,
    pub histogram: Vec<HistogramBin>,
    pub intervals: Vec<ConfidenceInterval>,
}

/// Batched, optionally parallel Monte Carlo simulator
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    evaluator: OutcomeEvaluator,
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(evaluator: OutcomeEvaluator, config: MonteCarloConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Run the simulation over `scenarios`
    ///
    /// # Errors
    ///
    /// `NoIterations` for a zero iteration count; `Cancelled` when `cancel`
    /// fires before every batch has run.
    pub fn run(
        &self,
        scenarios: &[PreparedScenario],
        cancel: &CancellationToken,
        log: &mut DiagnosticLog,
    ) -> Result<MonteCarloResult, MonteCarloError> {
        if self.config.iterations == 0 {
            return Err(MonteCarloError::NoIterations);
        }

        let iterations = if self.config.iterations > self.config.max_iterations {
            log.record(
                DiagnosticKind::IterationCapApplied,
                "monte_carlo",
                format!(
                    "{} iterations requested, capped at {}",
                    self.config.iterations, self.config.max_iterations
                ),
            );
            self.config.max_iterations.max(1)
        } else {
            self.config.iterations
        };

        let seed = self.config.seed.unwrap_or_else(RngManager::entropy_seed);
        let batch_size = self.config.batch_size.max(1);
        let batches = iterations.div_ceil(batch_size);
        let spread = self.config.variability_pct.abs() / 100.0;

        let span = tracing::info_span!("monte_carlo", seed, iterations, batches);
        let _guard = span.enter();

        let run_batch = |batch: usize| -> Option<Vec<f64>> {
            if cancel.is_cancelled() {
                return None;
            }
            let len = batch_size.min(iterations - batch * batch_size);
            let mut rng = RngManager::derive(seed, batch as u64);
            let samples = (0..len)
                .map(|_| {
                    let u = rng.uniform(-spread, spread);
                    self.evaluator
                        .portfolio_roi(scenarios, &Perturbation::uniform_noise(u))
                })
                .collect();
            Some(samples)
        };

        let results: Vec<Option<Vec<f64>>> = if self.config.parallel {
            (0..batches).into_par_iter().map(run_batch).collect()
        } else {
            (0..batches).map(run_batch).collect()
        };

        let completed_iterations: usize = results.iter().flatten().map(Vec::len).sum();
        if completed_iterations < iterations {
            tracing::info!(completed_iterations, "monte carlo cancelled");
            return Err(MonteCarloError::Cancelled {
                completed_iterations,
            });
        }

        let mut samples: Vec<f64> = results.into_iter().flatten().flatten().collect();
        samples.sort_by(f64::total_cmp);

        let levels = self.valid_levels(log);
        let result = MonteCarloResult {
            seed,
            iterations,
            variability_pct: self.config.variability_pct,
            baseline_roi: self
                .evaluator
                .portfolio_roi(scenarios, &Perturbation::identity()),
            mean: mean(&samples),
            median: median_of_sorted(&samples),
            std_dev: population_std_dev(&samples),
            min: samples.first().copied().unwrap_or(0.0),
            max: samples.last().copied().unwrap_or(0.0),
            probability_positive: samples.iter().filter(|r| **r > 0.0).count() as f64
                / samples.len() as f64,
            histogram: histogram(&samples, self.config.histogram_bins.max(1)),
            intervals: levels
                .into_iter()
                .map(|level| percentile_interval(&samples, level))
                .collect(),
        };

        tracing::info!(mean = result.mean, std_dev = result.std_dev, "monte carlo complete");
        Ok(result)
    }

    fn valid_levels(&self, log: &mut DiagnosticLog) -> Vec<f64> {
        self.config
            .confidence_levels
            .iter()
            .copied()
            .filter(|level| {
                let ok = *level > 0.0 && *level < 1.0;
                if !ok {
                    log.record(
                        DiagnosticKind::ParameterOutOfRange,
                        "monte_carlo",
                        format!("confidence level {level} outside (0, 1) ignored"),
                    );
                }
                ok
            })
            .collect()
    }
}

/// Index-based interval over sorted samples (no interpolation)
pub fn percentile_interval(sorted: &[f64], level: f64) -> ConfidenceInterval {
    let n = sorted.len();
    if n == 0 {
        return ConfidenceInterval {
            level,
            lower: 0.0,
            upper: 0.0,
        };
    }
    // Nudge before flooring so 0.05 × 100 lands on 5, not 4
    let index = |q: f64| (q * n as f64 + 1e-9).floor() as usize;
    let lower_idx = index((1.0 - level) / 2.0);
    let upper_idx = index((1.0 + level) / 2.0).min(n - 1);
    ConfidenceInterval {
        level,
        lower: sorted[lower_idx.min(n - 1)],
        upper: sorted[upper_idx],
    }
}

/// Equal-width histogram over `[min, max]` of sorted samples
///
/// Always `bins` entries. A degenerate distribution (min == max) puts every
/// sample in the first bin and leaves the rest empty.
pub fn histogram(sorted: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    if max <= min {
        let mut out = vec![
            HistogramBin {
                lower: min,
                upper: max,
                count: 0,
            };
            bins
        ];
        out[0].count = sorted.len();
        return out;
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for v in sorted {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_indices() {
        let sorted: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let ci = percentile_interval(&sorted, 0.90);
        assert_eq!(ci.lower, 5.0);
        assert_eq!(ci.upper, 95.0);

        let ci = percentile_interval(&sorted[..10], 0.99);
        assert_eq!(ci.lower, 0.0);
        assert_eq!(ci.upper, 9.0);
    }

    #[test]
    fn test_histogram_counts_every_sample() {
        let sorted: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let bins = histogram(&sorted, 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 101);
        assert_eq!(bins[19].upper, 100.0);
        assert_eq!(bins[0].count, 5);
    }

    #[test]
    fn test_histogram_degenerate() {
        let bins = histogram(&[3.0, 3.0, 3.0], 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].count, 3);
        assert!(bins[1..].iter().all(|b| b.count == 0));
        assert!(bins.iter().all(|b| b.lower == 3.0 && b.upper == 3.0));
    }

    #[test]
    fn test_cancelled_before_start() {
        let sim = MonteCarloSimulator::new(
            OutcomeEvaluator::default(),
            MonteCarloConfig {
                seed: Some(1),
                ..MonteCarloConfig::default()
            },
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = sim.run(&[], &cancel, &mut DiagnosticLog::new()).unwrap_err();
        assert_eq!(
            err,
            MonteCarloError::Cancelled {
                completed_iterations: 0
            }
        );
    }

    #[test]
    fn test_iteration_cap_recorded() {
        let sim = MonteCarloSimulator::new(
            OutcomeEvaluator::default(),
            MonteCarloConfig {
                iterations: 50,
                max_iterations: 10,
                seed: Some(7),
                ..MonteCarloConfig::default()
            },
        );
        let mut log = DiagnosticLog::new();
        let result = sim.run(&[], &CancellationToken::new(), &mut log).unwrap();
        assert_eq!(result.iterations, 10);
        assert!(log.has(DiagnosticKind::IterationCapApplied));
    }
}

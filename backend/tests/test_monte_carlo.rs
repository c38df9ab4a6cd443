//! Tests for the Monte Carlo simulator
//!
//! Seeded runs assert exact equality; unseeded runs assert statistical
//! properties only.

use kpi_forecast_core_rs::models::{
    Action, ActionCatalogue, PreparedScenario, Scenario, ScenarioAction,
};
use kpi_forecast_core_rs::simulation::{
    CancellationToken, MonteCarloConfig, MonteCarloError, MonteCarloSimulator, OutcomeEvaluator,
};
use kpi_forecast_core_rs::DiagnosticLog;

// ============================================================================
// Test Helpers
// ============================================================================

fn portfolio() -> Vec<PreparedScenario> {
    let catalogue = ActionCatalogue::from_actions(&[
        Action::new("A1").with_economics(500_000.0, 200_000.0),
        Action::new("A2").with_economics(300_000.0, 250_000.0),
    ]);
    let optimistic = Scenario::new("optimistic", 60.0)
        .with_action(ScenarioAction::new("A1").with_rates(80.0, 70.0))
        .with_action(ScenarioAction::new("A2").with_rates(90.0, 60.0));
    let cautious = Scenario::new("cautious", 40.0)
        .with_action(ScenarioAction::new("A1").with_rates(60.0, 50.0));

    let mut log = DiagnosticLog::new();
    vec![
        PreparedScenario::prepare(&optimistic, &catalogue, &mut log),
        PreparedScenario::prepare(&cautious, &catalogue, &mut log),
    ]
}

fn simulator(seed: Option<u64>, iterations: usize, parallel: bool) -> MonteCarloSimulator {
    MonteCarloSimulator::new(
        OutcomeEvaluator::default(),
        MonteCarloConfig {
            iterations,
            seed,
            parallel,
            batch_size: 64,
            ..MonteCarloConfig::default()
        },
    )
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_identical_results() {
    let scenarios = portfolio();
    let cancel = CancellationToken::new();
    let a = simulator(Some(42), 1000, true)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    let b = simulator(Some(42), 1000, true)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_thread_count_does_not_change_results() {
    let scenarios = portfolio();
    let cancel = CancellationToken::new();
    let parallel = simulator(Some(7), 777, true)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    let sequential = simulator(Some(7), 777, false)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_different_seeds_differ() {
    let scenarios = portfolio();
    let cancel = CancellationToken::new();
    let a = simulator(Some(1), 500, true)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    let b = simulator(Some(2), 500, true)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    assert_ne!(a.mean, b.mean);
    assert_ne!(a.std_dev, b.std_dev);
}

#[test]
fn test_unseeded_run_reports_replayable_seed() {
    let scenarios = portfolio();
    let cancel = CancellationToken::new();
    let first = simulator(None, 300, true)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    let replay = simulator(Some(first.seed), 300, true)
        .run(&scenarios, &cancel, &mut DiagnosticLog::new())
        .unwrap();
    assert_eq!(first, replay);
}

// ============================================================================
// Statistical properties
// ============================================================================

#[test]
fn test_summary_statistics_are_consistent() {
    let scenarios = portfolio();
    let result = simulator(None, 2000, true)
        .run(&scenarios, &CancellationToken::new(), &mut DiagnosticLog::new())
        .unwrap();

    assert_eq!(result.iterations, 2000);
    assert!(result.min <= result.median && result.median <= result.max);
    assert!(result.std_dev > 0.0);
    assert!((0.0..=1.0).contains(&result.probability_positive));

    // Noise is symmetric and ROI is close to linear in it
    assert!((result.mean - result.baseline_roi).abs() < result.std_dev);

    assert_eq!(result.histogram.len(), 20);
    assert_eq!(result.histogram.iter().map(|b| b.count).sum::<usize>(), 2000);

    let ci90 = &result.intervals[0];
    let ci95 = &result.intervals[1];
    assert_eq!(ci90.level, 0.90);
    assert!(ci95.lower <= ci90.lower && ci90.upper <= ci95.upper);
    assert!(ci95.lower >= result.min && ci95.upper <= result.max);
}

#[test]
fn test_zero_variability_collapses_distribution() {
    let scenarios = portfolio();
    let sim = MonteCarloSimulator::new(
        OutcomeEvaluator::default(),
        MonteCarloConfig {
            iterations: 100,
            variability_pct: 0.0,
            seed: Some(3),
            ..MonteCarloConfig::default()
        },
    );
    let result = sim
        .run(&scenarios, &CancellationToken::new(), &mut DiagnosticLog::new())
        .unwrap();
    assert!(result.std_dev < 1e-9);
    assert_eq!(result.min, result.max);
    assert!((result.mean - result.baseline_roi).abs() < 1e-9);
    assert_eq!(result.histogram.len(), 20);
    assert_eq!(result.histogram[0].count, 100);
    assert_eq!(result.histogram.iter().map(|b| b.count).sum::<usize>(), 100);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_zero_iterations_rejected() {
    let err = simulator(Some(1), 0, true)
        .run(&portfolio(), &CancellationToken::new(), &mut DiagnosticLog::new())
        .unwrap_err();
    assert_eq!(err, MonteCarloError::NoIterations);
}

#[test]
fn test_cancellation_is_reported() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = simulator(Some(1), 1000, true)
        .run(&portfolio(), &cancel, &mut DiagnosticLog::new())
        .unwrap_err();
    assert!(matches!(err, MonteCarloError::Cancelled { .. }));
}

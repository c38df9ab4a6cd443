//! Tests for trend analysis, forecasting and profiles
//!
//! Covers the neutral degradation for short series, the volatility override
//! and the reference quarterly series 100 → 130 against a target of 150.

use kpi_forecast_core_rs::models::{Kpi, KpiSeries, Observation};
use kpi_forecast_core_rs::profile::PerformanceProfileBuilder;
use kpi_forecast_core_rs::stats::{TimeSeriesStatistics, TrendDirection, TrendStrength};
use kpi_forecast_core_rs::{DiagnosticKind, DiagnosticLog, Period};

// ============================================================================
// Test Helpers
// ============================================================================

fn series_from(start: &str, values: &[f64]) -> Vec<Observation> {
    let start: Period = start.parse().unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Observation::new(start.advance(i as i64), *v))
        .collect()
}

fn reference_series() -> Vec<Observation> {
    series_from("2024-Q1", &[100.0, 110.0, 120.0, 130.0])
}

// ============================================================================
// Trend
// ============================================================================

#[test]
fn test_short_series_has_zero_confidence() {
    let stats = TimeSeriesStatistics::default();
    let trend = stats.analyze_trend(&series_from("2024-Q1", &[40.0, 55.0]));
    assert_eq!(trend.confidence, 0.0);
    assert_eq!(trend.projected_next, 55.0);
    assert!(!trend.sufficient_data);
}

#[test]
fn test_constant_step_series() {
    let stats = TimeSeriesStatistics::default();
    let trend = stats.analyze_trend(&series_from("2023-Q1", &[10.0, 12.0, 14.0, 16.0, 18.0]));
    assert!(trend.slope > 0.0);
    assert!((trend.r_squared - 1.0).abs() < 1e-9);
    assert!((trend.confidence - 100.0).abs() < 1e-6);
    assert_eq!(trend.direction, TrendDirection::Increasing);
    assert_eq!(trend.strength, TrendStrength::Strong);
}

#[test]
fn test_alternating_series_is_volatile() {
    let stats = TimeSeriesStatistics::default();
    // Rising overall, but swings far beyond 30% of the mean
    let trend = stats.analyze_trend(&series_from(
        "2023-Q1",
        &[100.0, 200.0, 110.0, 210.0, 120.0, 220.0],
    ));
    assert!(trend.slope > 0.0);
    assert_eq!(trend.direction, TrendDirection::Volatile);

    let falling = stats.analyze_trend(&series_from(
        "2023-Q1",
        &[220.0, 120.0, 210.0, 110.0, 200.0, 100.0],
    ));
    assert!(falling.slope < 0.0);
    assert_eq!(falling.direction, TrendDirection::Volatile);
}

#[test]
fn test_unsorted_input_is_sorted_first() {
    let stats = TimeSeriesStatistics::default();
    let mut shuffled = reference_series();
    shuffled.swap(0, 3);
    shuffled.swap(1, 2);
    let trend = stats.analyze_trend(&shuffled);
    assert!((trend.slope - 10.0).abs() < 1e-9);
}

// ============================================================================
// Forecast
// ============================================================================

#[test]
fn test_reference_series_forecast() {
    let stats = TimeSeriesStatistics::default();
    let trend = stats.analyze_trend(&reference_series());
    assert!((trend.slope - 10.0).abs() < 1e-9);
    assert_eq!(trend.direction, TrendDirection::Increasing);

    let forecast = stats.generate_forecast(&reference_series());
    let first = &forecast.points[0];
    assert_eq!(first.period.to_string(), "2025-Q1");
    assert!((first.value - 140.0).abs() < 1e-9);
    assert_eq!(forecast.points.len(), 4);
    assert_eq!(forecast.points[3].period.to_string(), "2025-Q4");
    assert!((forecast.probability - 0.9).abs() < 1e-9);
}

#[test]
fn test_flat_series_forecast_has_zero_width() {
    let stats = TimeSeriesStatistics::default();
    let forecast = stats.generate_forecast(&series_from("2024-Q1", &[50.0; 6]));
    assert_eq!(forecast.half_width, 0.0);
    for point in &forecast.points {
        assert_eq!(point.value, 50.0);
        assert_eq!(point.lower, 50.0);
        assert_eq!(point.upper, 50.0);
    }
}

#[test]
fn test_forecast_band_uses_sample_std_dev() {
    let stats = TimeSeriesStatistics::default();
    let forecast = stats.generate_forecast(&reference_series());
    // sample std of 100,110,120,130 = sqrt(500/3)
    let expected = 1.96 * (500.0f64 / 3.0).sqrt();
    assert!((forecast.half_width - expected).abs() < 1e-9);
}

// ============================================================================
// Profiles
// ============================================================================

#[test]
fn test_reference_profile_achievement() {
    let builder = PerformanceProfileBuilder::default();
    let kpi = Kpi::new("OEE", Some(150.0));
    let series = vec![KpiSeries::new("OEE", "F1", reference_series())];
    let mut log = DiagnosticLog::new();

    let profiles = builder.build(&kpi, &series, &mut log).unwrap();
    assert_eq!(profiles.len(), 1);
    let p = &profiles[0];
    assert_eq!(p.current_period.map(|c| c.to_string()).as_deref(), Some("2024-Q4"));
    assert!((p.achievement_rate.unwrap() - 86.6667).abs() < 1e-3);
    assert!(p.tags.contains(&"improving".to_string()));
    assert!(p.tags.contains(&"at-risk".to_string()));
    assert!(!log.has(DiagnosticKind::InsufficientData));
}

#[test]
fn test_short_history_profile_is_flagged() {
    let builder = PerformanceProfileBuilder::default();
    let kpi = Kpi::new("OEE", Some(150.0));
    let series = vec![KpiSeries::new("OEE", "F1", series_from("2024-Q1", &[100.0]))];
    let mut log = DiagnosticLog::new();

    let profiles = builder.build(&kpi, &series, &mut log).unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].trend.confidence, 0.0);
    assert!(log.has(DiagnosticKind::InsufficientData));
}

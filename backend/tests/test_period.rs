//! Tests for quarter periods
//!
//! Labels, ordering, rollover arithmetic and serde round trips.

use kpi_forecast_core_rs::{Period, PeriodError};

#[test]
fn test_parse_and_display() {
    let p: Period = "2024-Q3".parse().unwrap();
    assert_eq!(p.year(), 2024);
    assert_eq!(p.quarter(), 3);
    assert_eq!(p.to_string(), "2024-Q3");

    // Lower-case marker and surrounding whitespace are accepted
    let p: Period = " 2023-q1 ".parse().unwrap();
    assert_eq!(p.to_string(), "2023-Q1");
}

#[test]
fn test_malformed_labels_rejected() {
    assert_eq!(
        "2024-Q5".parse::<Period>(),
        Err(PeriodError::InvalidQuarter(5))
    );
    assert!(matches!(
        "24-Q1".parse::<Period>(),
        Err(PeriodError::Malformed(_))
    ));
    assert!(matches!(
        "2024Q1".parse::<Period>(),
        Err(PeriodError::Malformed(_))
    ));
    assert!(matches!(
        "2024-X1".parse::<Period>(),
        Err(PeriodError::Malformed(_))
    ));
    assert_eq!(Period::new(2024, 0), Err(PeriodError::InvalidQuarter(0)));
}

#[test]
fn test_rollover() {
    let q4 = Period::new(2024, 4).unwrap();
    assert_eq!(q4.next(), Period::new(2025, 1).unwrap());
    assert_eq!(q4.advance(5).to_string(), "2026-Q1");
    assert_eq!(q4.advance(-4).to_string(), "2023-Q4");
}

#[test]
fn test_ordering_is_chronological() {
    let mut periods: Vec<Period> = ["2025-Q1", "2024-Q4", "2024-Q1", "2023-Q3"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    periods.sort();
    let labels: Vec<String> = periods.iter().map(Period::to_string).collect();
    assert_eq!(labels, vec!["2023-Q3", "2024-Q1", "2024-Q4", "2025-Q1"]);
}

#[test]
fn test_quarters_until() {
    let a = Period::new(2023, 3).unwrap();
    let b = Period::new(2024, 2).unwrap();
    assert_eq!(a.quarters_until(&b), 3);
    assert_eq!(b.quarters_until(&a), -3);
    assert_eq!(Period::from_ordinal(a.ordinal()), a);
}

#[test]
fn test_serde_as_string() {
    let p = Period::new(2024, 2).unwrap();
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, "\"2024-Q2\"");
    let back: Period = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);

    assert!(serde_json::from_str::<Period>("\"2024-Q9\"").is_err());
}

//! KPI, factory and observation records
//!
//! A KPI is tracked per factory as a series of quarter-labelled observations.
//! The data layer makes no ordering promise, so series are always sorted by
//! period before any statistic is computed.

use crate::core::Period;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single measured value for one period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    pub value: f64,
}

impl Observation {
    pub fn new(period: Period, value: f64) -> Self {
        Self { period, value }
    }
}

/// A tracked performance indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    /// Unique KPI identifier
    pub id: String,

    /// Human-readable description
    #[serde(default)]
    pub text: String,

    /// Target value (None or non-positive = invalid target, see `TargetPolicy`)
    #[serde(default)]
    pub target: Option<f64>,

    /// Strategic theme tags
    #[serde(default)]
    pub themes: Vec<String>,

    /// Optional portfolio weight
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Kpi {
    pub fn new(id: impl Into<String>, target: Option<f64>) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            target,
            themes: Vec::new(),
            weight: None,
        }
    }

    /// Target if it is usable for achievement arithmetic (finite and positive)
    pub fn valid_target(&self) -> Option<f64> {
        self.target.filter(|t| t.is_finite() && *t > 0.0)
    }
}

/// A measured entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factory {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Free-form descriptive metadata (region, segment, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Factory {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            metadata: BTreeMap::new(),
        }
    }
}

/// Observation history of one KPI at one factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSeries {
    pub kpi_id: String,
    pub factory_id: String,
    pub observations: Vec<Observation>,
}

impl KpiSeries {
    pub fn new(
        kpi_id: impl Into<String>,
        factory_id: impl Into<String>,
        observations: Vec<Observation>,
    ) -> Self {
        Self {
            kpi_id: kpi_id.into(),
            factory_id: factory_id.into(),
            observations,
        }
    }

    /// Observations sorted chronologically
    ///
    /// Duplicate periods are kept in their input order (stable sort); the
    /// statistics treat them as separate samples.
    pub fn sorted(&self) -> Vec<Observation> {
        let mut obs: Vec<Observation> = self
            .observations
            .iter()
            .copied()
            .filter(|o| o.value.is_finite())
            .collect();
        obs.sort_by_key(|o| o.period);
        obs
    }

    /// Most recent observation, if any
    pub fn latest(&self) -> Option<Observation> {
        self.observations
            .iter()
            .filter(|o| o.value.is_finite())
            .max_by_key(|o| o.period)
            .copied()
    }
}

/// Values of a chronologically sorted observation slice
pub fn values_of(observations: &[Observation]) -> Vec<f64> {
    observations.iter().map(|o| o.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(label: &str) -> Period {
        label.parse().unwrap()
    }

    #[test]
    fn test_series_sorted_regardless_of_input_order() {
        let series = KpiSeries::new(
            "oee",
            "F1",
            vec![
                Observation::new(p("2024-Q3"), 3.0),
                Observation::new(p("2023-Q4"), 1.0),
                Observation::new(p("2024-Q1"), 2.0),
            ],
        );
        let values = values_of(&series.sorted());
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.latest().unwrap().period, p("2024-Q3"));
    }

    #[test]
    fn test_non_finite_values_dropped() {
        let series = KpiSeries::new(
            "oee",
            "F1",
            vec![
                Observation::new(p("2024-Q1"), f64::NAN),
                Observation::new(p("2024-Q2"), 5.0),
            ],
        );
        assert_eq!(series.sorted().len(), 1);
    }

    #[test]
    fn test_valid_target() {
        assert_eq!(Kpi::new("a", Some(150.0)).valid_target(), Some(150.0));
        assert_eq!(Kpi::new("a", Some(0.0)).valid_target(), None);
        assert_eq!(Kpi::new("a", Some(-5.0)).valid_target(), None);
        assert_eq!(Kpi::new("a", None).valid_target(), None);
    }
}

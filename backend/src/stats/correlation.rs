//! Pairwise KPI correlation and greedy clustering

use super::descriptive::{mean, pearson};
use super::{TimeSeriesStatistics, MIN_CORRELATION_PERIODS};
use crate::core::Period;
use crate::models::Observation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// |r| above which a pair is "strong" and eligible for clustering
const STRONG_CORRELATION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    None,
}

impl CorrelationStrength {
    /// Bands on |r|: >0.7 strong, >0.3 moderate, >0.1 weak
    pub fn from_coefficient(r: f64) -> Self {
        let r = r.abs();
        if r > STRONG_CORRELATION {
            CorrelationStrength::Strong
        } else if r > 0.3 {
            CorrelationStrength::Moderate
        } else if r > 0.1 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationDirection {
    Positive,
    Negative,
    None,
}

/// Correlation of two KPI series over their common periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub kpi_a: String,
    pub kpi_b: String,
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    pub common_periods: usize,
}

/// All pairs plus strongly-correlated clusters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub pairs: Vec<CorrelationPair>,
    /// Groups built by one greedy pass over strong pairs (see
    /// [`TimeSeriesStatistics::analyze_correlations`])
    pub clusters: Vec<Vec<String>>,
    /// Pairs skipped for lack of common periods
    pub skipped_pairs: Vec<(String, String)>,
}

impl TimeSeriesStatistics {
    /// Correlate every pair of series sharing at least three periods
    ///
    /// Clustering is a single greedy pass over strong pairs in key order: a
    /// pair joins the first existing cluster containing either member,
    /// otherwise it starts a new cluster. Two existing clusters are never
    /// merged, so membership is not transitively closed.
    pub fn analyze_correlations(
        &self,
        series: &BTreeMap<String, Vec<Observation>>,
    ) -> CorrelationResult {
        let by_period: Vec<(&String, BTreeMap<Period, f64>)> = series
            .iter()
            .map(|(id, obs)| (id, period_means(obs)))
            .collect();

        let mut result = CorrelationResult::default();

        for i in 0..by_period.len() {
            for j in (i + 1)..by_period.len() {
                let (id_a, a) = &by_period[i];
                let (id_b, b) = &by_period[j];

                let (xs, ys): (Vec<f64>, Vec<f64>) = a
                    .iter()
                    .filter_map(|(period, va)| b.get(period).map(|vb| (*va, *vb)))
                    .unzip();

                if xs.len() < MIN_CORRELATION_PERIODS {
                    result
                        .skipped_pairs
                        .push(((*id_a).clone(), (*id_b).clone()));
                    continue;
                }

                let coefficient = pearson(&xs, &ys).unwrap_or(0.0);
                let strength = CorrelationStrength::from_coefficient(coefficient);
                let direction = if strength == CorrelationStrength::None {
                    CorrelationDirection::None
                } else if coefficient > 0.0 {
                    CorrelationDirection::Positive
                } else {
                    CorrelationDirection::Negative
                };

                result.pairs.push(CorrelationPair {
                    kpi_a: (*id_a).clone(),
                    kpi_b: (*id_b).clone(),
                    coefficient,
                    strength,
                    direction,
                    common_periods: xs.len(),
                });
            }
        }

        result.clusters = greedy_clusters(&result.pairs);
        result
    }
}

/// Mean value per period (duplicate periods are averaged)
fn period_means(observations: &[Observation]) -> BTreeMap<Period, f64> {
    let mut grouped: BTreeMap<Period, Vec<f64>> = BTreeMap::new();
    for o in observations.iter().filter(|o| o.value.is_finite()) {
        grouped.entry(o.period).or_default().push(o.value);
    }
    grouped.into_iter().map(|(p, vs)| (p, mean(&vs))).collect()
}

fn greedy_clusters(pairs: &[CorrelationPair]) -> Vec<Vec<String>> {
    let mut clusters: Vec<Vec<String>> = Vec::new();
    for pair in pairs
        .iter()
        .filter(|p| p.strength == CorrelationStrength::Strong)
    {
        let target = clusters
            .iter_mut()
            .find(|c| c.contains(&pair.kpi_a) || c.contains(&pair.kpi_b));
        match target {
            Some(cluster) => {
                for id in [&pair.kpi_a, &pair.kpi_b] {
                    if !cluster.contains(id) {
                        cluster.push(id.clone());
                    }
                }
            }
            None => clusters.push(vec![pair.kpi_a.clone(), pair.kpi_b.clone()]),
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str, r: f64) -> CorrelationPair {
        CorrelationPair {
            kpi_a: a.to_string(),
            kpi_b: b.to_string(),
            coefficient: r,
            strength: CorrelationStrength::from_coefficient(r),
            direction: CorrelationDirection::Positive,
            common_periods: 4,
        }
    }

    #[test]
    fn test_greedy_pass_does_not_merge_existing_clusters() {
        // a-b, c-d form two clusters; b-c then joins the first cluster only
        let pairs = vec![
            pair("a", "b", 0.9),
            pair("c", "d", 0.9),
            pair("b", "c", 0.95),
        ];
        let clusters = greedy_clusters(&pairs);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], vec!["a", "b", "c"]);
        assert_eq!(clusters[1], vec!["c", "d"]);
    }

    #[test]
    fn test_weak_pairs_never_cluster() {
        let clusters = greedy_clusters(&[pair("a", "b", 0.5)]);
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_strength_bands() {
        assert_eq!(CorrelationStrength::from_coefficient(-0.8), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_coefficient(0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(0.2), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_coefficient(0.05), CorrelationStrength::None);
    }
}

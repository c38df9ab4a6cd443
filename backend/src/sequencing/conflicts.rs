//! Resource-demand conflicts over time
//!
//! Candidate instants are every action start and end. At each instant the
//! demand is the summed resource requirement of actions occupying it, with
//! occupancy half-open `[start, start + duration)`.

use crate::models::PlannedAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Suggested resolution, graded by how far demand exceeds capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// More than 50% over capacity
    Reschedule,
    /// 25-50% over
    AddCapacityOrReprioritize,
    /// Under 25% over
    FineTune,
}

impl ConflictResolution {
    fn for_excess_ratio(ratio: f64) -> Self {
        if ratio > 0.5 {
            ConflictResolution::Reschedule
        } else if ratio >= 0.25 {
            ConflictResolution::AddCapacityOrReprioritize
        } else {
            ConflictResolution::FineTune
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConflict {
    pub step: u32,
    pub actions: Vec<String>,
    pub total_demand: f64,
    pub available_capacity: f64,
    pub resolution: ConflictResolution,
}

impl ResourceConflict {
    pub fn excess(&self) -> f64 {
        (self.total_demand - self.available_capacity).max(0.0)
    }
}

/// Demand at one candidate instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub step: u32,
    pub demand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    pub timeline: Vec<DemandPoint>,
    pub conflicts: Vec<ResourceConflict>,
    pub peak_demand: f64,
    /// (1 − total excess / total nominal capacity) × 100
    pub efficiency_pct: f64,
    /// Optimistic bound: current + gain × conflicts, capped at 100
    pub optimized_efficiency_pct: f64,
}

/// Scan demand at every start/end instant
pub fn resource_profile(
    actions: &[PlannedAction],
    capacity: f64,
    optimization_gain_pct: f64,
) -> ResourceProfile {
    let boundaries: BTreeSet<u32> = actions
        .iter()
        .flat_map(|a| [a.plan.start(), a.plan.end()])
        .collect();

    let mut timeline = Vec::with_capacity(boundaries.len());
    let mut conflicts = Vec::new();
    let mut total_excess = 0.0;

    for &step in &boundaries {
        let occupying: Vec<&PlannedAction> = actions
            .iter()
            .filter(|a| a.plan.start() <= step && step < a.plan.end())
            .collect();
        let demand: f64 = occupying.iter().map(|a| a.plan.resource_requirement).sum();
        timeline.push(DemandPoint { step, demand });

        if demand > capacity {
            total_excess += demand - capacity;
            let ratio = if capacity > 0.0 {
                (demand - capacity) / capacity
            } else {
                f64::INFINITY
            };
            let mut ids: Vec<String> = occupying.iter().map(|a| a.id().to_string()).collect();
            ids.sort();
            tracing::debug!(step, demand, capacity, "resource conflict");
            conflicts.push(ResourceConflict {
                step,
                actions: ids,
                total_demand: demand,
                available_capacity: capacity,
                resolution: ConflictResolution::for_excess_ratio(ratio),
            });
        }
    }

    let nominal = capacity * boundaries.len() as f64;
    let efficiency_pct = if nominal > 0.0 {
        ((1.0 - total_excess / nominal) * 100.0).max(0.0)
    } else {
        100.0
    };
    let optimized_efficiency_pct =
        (efficiency_pct + optimization_gain_pct * conflicts.len() as f64).min(100.0);

    ResourceProfile {
        peak_demand: timeline.iter().map(|p| p.demand).fold(0.0, f64::max),
        timeline,
        conflicts,
        efficiency_pct,
        optimized_efficiency_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, ScenarioAction};

    fn planned(id: &str, start: u32, duration: u32, resource: f64) -> PlannedAction {
        PlannedAction {
            action: Action::new(id),
            plan: ScenarioAction::new(id)
                .with_timing(start, duration)
                .with_resource(resource),
        }
    }

    #[test]
    fn test_full_overlap_is_one_conflict() {
        let profile = resource_profile(
            &[planned("a", 0, 2, 60.0), planned("b", 0, 2, 60.0)],
            100.0,
            10.0,
        );
        assert_eq!(profile.conflicts.len(), 1);
        let c = &profile.conflicts[0];
        assert_eq!(c.total_demand, 120.0);
        assert_eq!(c.available_capacity, 100.0);
        assert_eq!(c.actions, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(c.resolution, ConflictResolution::FineTune);
        // two boundaries, 20 excess over 200 nominal
        assert!((profile.efficiency_pct - 90.0).abs() < 1e-9);
        assert!((profile.optimized_efficiency_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_back_to_back_actions_do_not_conflict() {
        let profile = resource_profile(
            &[planned("a", 0, 2, 80.0), planned("b", 2, 2, 80.0)],
            100.0,
            10.0,
        );
        assert!(profile.conflicts.is_empty());
        assert_eq!(profile.peak_demand, 80.0);
    }

    #[test]
    fn test_resolution_grades() {
        assert_eq!(ConflictResolution::for_excess_ratio(0.6), ConflictResolution::Reschedule);
        assert_eq!(
            ConflictResolution::for_excess_ratio(0.3),
            ConflictResolution::AddCapacityOrReprioritize
        );
        assert_eq!(ConflictResolution::for_excess_ratio(0.1), ConflictResolution::FineTune);
    }
}

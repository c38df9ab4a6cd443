//! Action sequencing and resource optimisation
//!
//! - **priority**: weighted priority score and critical-path flag
//! - **conflicts**: capacity conflicts at start/end instants, efficiency
//! - **dependencies**: explicit dependency graph with cycle breaking
//!
//! [`ActionSequencer::sequence`] combines the three into one plan per
//! scenario. The optimised efficiency it reports is a heuristic bound, not a
//! proven optimum.

pub mod conflicts;
pub mod dependencies;
pub mod priority;

pub use conflicts::{
    resource_profile, ConflictResolution, DemandPoint, ResourceConflict, ResourceProfile,
};
pub use dependencies::DependencyGraph;
pub use priority::{score_action, ActionPriority};

use crate::models::{DiagnosticLog, PreparedScenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencingConfig {
    /// Resource capacity available at any instant (%)
    pub capacity: f64,

    /// Summed |impact| that earns the full impact component
    pub impact_normalization: f64,

    /// Durations at or below this earn the full speed component
    pub reference_duration: f64,

    /// Priority above this marks an action as critical path
    pub critical_threshold: f64,

    /// Optimistic efficiency gain per resolved conflict (percentage points)
    pub optimization_gain_pct: f64,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            capacity: 100.0,
            impact_normalization: 1.0,
            reference_duration: 60.0,
            critical_threshold: 0.8,
            optimization_gain_pct: 10.0,
        }
    }
}

/// One action in execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedAction {
    /// 1-based position in the execution order
    pub position: usize,
    pub priority: ActionPriority,
    /// Prerequisites left after cycle breaking
    pub depends_on: Vec<String>,
    pub planned_start: u32,
    pub planned_end: u32,
    /// Earliest dependency-respecting start, ignoring planned delays
    pub earliest_start: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePlan {
    pub scenario_id: String,
    pub actions: Vec<SequencedAction>,
    /// Ids of critical-path actions, in execution order
    pub critical_path: Vec<String>,
    pub resources: ResourceProfile,
    /// Last planned end step
    pub planned_makespan: u32,
    /// Makespan if every action started as early as its dependencies allow
    pub dependency_makespan: u32,
    /// Steps that could be saved by removing slack from the plan
    pub acceleration_steps: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ActionSequencer {
    config: SequencingConfig,
}

impl ActionSequencer {
    pub fn new(config: SequencingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequencingConfig {
        &self.config
    }

    pub fn sequence(&self, scenario: &PreparedScenario, log: &mut DiagnosticLog) -> SequencePlan {
        let actions = &scenario.actions;
        let priorities: BTreeMap<String, ActionPriority> = actions
            .iter()
            .map(|a| (a.id().to_string(), score_action(a, &self.config)))
            .collect();
        let scores: BTreeMap<String, f64> = priorities
            .iter()
            .map(|(id, p)| (id.clone(), p.score))
            .collect();

        let graph = DependencyGraph::build(actions, scenario.id(), log);
        let earliest = graph.earliest_starts(actions);
        let by_id: BTreeMap<&str, _> = actions.iter().map(|a| (a.id(), &a.plan)).collect();

        let ordered: Vec<SequencedAction> = graph
            .execution_order(&scores)
            .into_iter()
            .filter_map(|id| {
                let plan = by_id.get(id.as_str())?;
                let priority = priorities.get(&id)?.clone();
                Some((id, plan, priority))
            })
            .enumerate()
            .map(|(i, (id, plan, priority))| SequencedAction {
                position: i + 1,
                depends_on: graph.prerequisites(&id),
                planned_start: plan.start(),
                planned_end: plan.end(),
                earliest_start: earliest.get(&id).copied().unwrap_or(0),
                priority,
            })
            .collect();

        let critical_path = ordered
            .iter()
            .filter(|a| a.priority.critical_path)
            .map(|a| a.priority.action_id.clone())
            .collect();

        let planned_makespan = ordered.iter().map(|a| a.planned_end).max().unwrap_or(0);
        let dependency_makespan = ordered
            .iter()
            .map(|a| {
                a.earliest_start
                    .saturating_add(a.planned_end.saturating_sub(a.planned_start).max(1))
            })
            .max()
            .unwrap_or(0);

        let resources = resource_profile(
            actions,
            self.config.capacity,
            self.config.optimization_gain_pct,
        );

        tracing::debug!(
            scenario = %scenario.id(),
            actions = ordered.len(),
            conflicts = resources.conflicts.len(),
            "scenario sequenced"
        );

        SequencePlan {
            scenario_id: scenario.id().to_string(),
            actions: ordered,
            critical_path,
            resources,
            planned_makespan,
            dependency_makespan,
            acceleration_steps: planned_makespan.saturating_sub(dependency_makespan),
        }
    }
}

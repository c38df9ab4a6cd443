//! Tests for action sequencing, resource conflicts and dependencies

use kpi_forecast_core_rs::models::{
    Action, ActionCatalogue, PreparedScenario, Scenario, ScenarioAction,
};
use kpi_forecast_core_rs::sequencing::{
    ActionSequencer, ConflictResolution, SequencePlan, SequencingConfig,
};
use kpi_forecast_core_rs::{DiagnosticKind, DiagnosticLog};

fn sequence(actions: &[Action], scenario: Scenario) -> (SequencePlan, DiagnosticLog) {
    let mut log = DiagnosticLog::new();
    let prepared =
        PreparedScenario::prepare(&scenario, &ActionCatalogue::from_actions(actions), &mut log);
    let plan = ActionSequencer::default().sequence(&prepared, &mut log);
    (plan, log)
}

fn order(plan: &SequencePlan) -> Vec<&str> {
    plan.actions
        .iter()
        .map(|a| a.priority.action_id.as_str())
        .collect()
}

// ============================================================================
// Priority
// ============================================================================

#[test]
fn test_priority_components() {
    let (plan, _) = sequence(
        &[Action::new("A").with_impact("OEE", 0.5)],
        Scenario::new("s", 100.0).with_action(
            ScenarioAction::new("A")
                .with_timing(0, 120)
                .with_rates(100.0, 80.0)
                .with_resource(100.0),
        ),
    );
    let p = &plan.actions[0].priority;
    assert!((p.impact_component - 0.2).abs() < 1e-12);
    assert!((p.success_component - 0.24).abs() < 1e-12);
    assert!((p.efficiency_component - 0.1).abs() < 1e-12);
    assert!((p.speed_component - 0.05).abs() < 1e-12);
    assert!((p.score - 0.59).abs() < 1e-12);
    assert!(!p.critical_path);
}

#[test]
fn test_high_priority_runs_first_and_is_critical() {
    let (plan, _) = sequence(
        &[
            Action::new("A"),
            Action::new("B").with_impact("OEE", 1.0),
        ],
        Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("A"))
            .with_action(ScenarioAction::new("B")),
    );
    assert_eq!(order(&plan), vec!["B", "A"]);
    assert!((plan.actions[0].priority.score - 1.0).abs() < 1e-12);
    assert_eq!(plan.critical_path, vec!["B".to_string()]);
    assert_eq!(plan.actions[0].position, 1);
}

#[test]
fn test_equal_priority_ties_break_by_id() {
    let (plan, _) = sequence(
        &[Action::new("C"), Action::new("A"), Action::new("B")],
        Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("C"))
            .with_action(ScenarioAction::new("A"))
            .with_action(ScenarioAction::new("B")),
    );
    assert_eq!(order(&plan), vec!["A", "B", "C"]);
}

// ============================================================================
// Resource conflicts
// ============================================================================

#[test]
fn test_overlapping_actions_conflict() {
    let (plan, _) = sequence(
        &[Action::new("A"), Action::new("B")],
        Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("A").with_timing(0, 3).with_resource(60.0))
            .with_action(ScenarioAction::new("B").with_timing(1, 3).with_resource(60.0)),
    );
    let resources = &plan.resources;
    assert_eq!(resources.conflicts.len(), 1);

    let conflict = &resources.conflicts[0];
    assert_eq!(conflict.step, 1);
    assert_eq!(conflict.actions, vec!["A".to_string(), "B".to_string()]);
    assert!((conflict.total_demand - 120.0).abs() < 1e-12);
    assert!((conflict.excess() - 20.0).abs() < 1e-12);
    assert_eq!(conflict.resolution, ConflictResolution::FineTune);

    assert!((resources.peak_demand - 120.0).abs() < 1e-12);
    // four instants (0, 1, 3, 4), 20 excess over 400 nominal
    assert!((resources.efficiency_pct - 95.0).abs() < 1e-9);
    assert!((resources.optimized_efficiency_pct - 100.0).abs() < 1e-9);
}

#[test]
fn test_heavy_overload_suggests_reschedule() {
    let actions: Vec<Action> = ["A", "B", "C"].iter().map(|id| Action::new(*id)).collect();
    let mut scenario = Scenario::new("s", 100.0);
    for id in ["A", "B", "C"] {
        scenario = scenario.with_action(ScenarioAction::new(id).with_timing(0, 2).with_resource(70.0));
    }
    let (plan, _) = sequence(&actions, scenario);
    assert_eq!(plan.resources.conflicts.len(), 1);
    assert_eq!(
        plan.resources.conflicts[0].resolution,
        ConflictResolution::Reschedule
    );
}

#[test]
fn test_sequential_actions_do_not_conflict() {
    let (plan, _) = sequence(
        &[Action::new("A"), Action::new("B")],
        Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("A").with_timing(0, 2).with_resource(80.0))
            .with_action(ScenarioAction::new("B").with_timing(2, 2).with_resource(80.0)),
    );
    assert!(plan.resources.conflicts.is_empty());
    assert!((plan.resources.efficiency_pct - 100.0).abs() < 1e-12);
}

#[test]
fn test_custom_capacity() {
    let mut log = DiagnosticLog::new();
    let prepared = PreparedScenario::prepare(
        &Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("A").with_resource(60.0)),
        &ActionCatalogue::from_actions(&[Action::new("A")]),
        &mut log,
    );
    let sequencer = ActionSequencer::new(SequencingConfig {
        capacity: 50.0,
        ..SequencingConfig::default()
    });
    let plan = sequencer.sequence(&prepared, &mut log);
    assert_eq!(plan.resources.conflicts.len(), 1);
    assert!((plan.resources.conflicts[0].available_capacity - 50.0).abs() < 1e-12);
}

// ============================================================================
// Dependencies
// ============================================================================

#[test]
fn test_dependency_bound_schedule() {
    let (plan, _) = sequence(
        &[Action::new("A"), Action::new("B"), Action::new("C")],
        Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("C").with_timing(0, 1).with_dependency("B"))
            .with_action(ScenarioAction::new("B").with_timing(5, 3).with_dependency("A"))
            .with_action(ScenarioAction::new("A").with_timing(0, 2)),
    );
    assert_eq!(order(&plan), vec!["A", "B", "C"]);
    let starts: Vec<u32> = plan.actions.iter().map(|a| a.earliest_start).collect();
    assert_eq!(starts, vec![0, 2, 5]);
    assert_eq!(plan.actions[2].depends_on, vec!["B".to_string()]);
    assert_eq!(plan.planned_makespan, 8);
    assert_eq!(plan.dependency_makespan, 6);
    assert_eq!(plan.acceleration_steps, 2);
}

#[test]
fn test_long_chain_schedule_saturates() {
    let (plan, _) = sequence(
        &[Action::new("A"), Action::new("B"), Action::new("C")],
        Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("A").with_timing(0, 3_000_000_000))
            .with_action(
                ScenarioAction::new("B")
                    .with_timing(0, 3_000_000_000)
                    .with_dependency("A"),
            )
            .with_action(ScenarioAction::new("C").with_timing(0, 1).with_dependency("B")),
    );
    assert_eq!(order(&plan), vec!["A", "B", "C"]);
    let starts: Vec<u32> = plan.actions.iter().map(|a| a.earliest_start).collect();
    assert_eq!(starts, vec![0, 3_000_000_000, u32::MAX]);
    assert_eq!(plan.dependency_makespan, u32::MAX);
    assert_eq!(plan.acceleration_steps, 0);
}

#[test]
fn test_cycle_is_broken_and_reported() {
    let (plan, log) = sequence(
        &[Action::new("A"), Action::new("B"), Action::new("C")],
        Scenario::new("s", 100.0)
            .with_action(ScenarioAction::new("A").with_dependency("B"))
            .with_action(ScenarioAction::new("B").with_dependency("A"))
            .with_action(ScenarioAction::new("C").with_dependency("A")),
    );
    assert!(log.has(DiagnosticKind::DependencyCycle));
    assert_eq!(plan.actions.len(), 3);

    let ids = order(&plan);
    let pos = |id: &str| ids.iter().position(|x| *x == id).unwrap();
    assert!(pos("A") < pos("C"));
    // Edges inside the cycle are gone; the edge leaving it stays
    let a = plan.actions.iter().find(|a| a.priority.action_id == "A").unwrap();
    assert!(a.depends_on.is_empty());
    let c = plan.actions.iter().find(|a| a.priority.action_id == "C").unwrap();
    assert_eq!(c.depends_on, vec!["A".to_string()]);
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let (plan, log) = sequence(
        &[Action::new("A")],
        Scenario::new("s", 100.0).with_action(ScenarioAction::new("A").with_dependency("A")),
    );
    assert!(log.has(DiagnosticKind::DependencyCycle));
    assert_eq!(order(&plan), vec!["A"]);
}

#[test]
fn test_unknown_dependency_is_ignored() {
    let (plan, log) = sequence(
        &[Action::new("A")],
        Scenario::new("s", 100.0).with_action(ScenarioAction::new("A").with_dependency("ghost")),
    );
    assert!(log.has(DiagnosticKind::UnknownReference));
    assert!(plan.actions[0].depends_on.is_empty());
}

#[test]
fn test_empty_scenario_yields_empty_plan() {
    let (plan, log) = sequence(&[], Scenario::new("s", 100.0));
    assert!(plan.actions.is_empty());
    assert!(plan.resources.conflicts.is_empty());
    assert_eq!(plan.planned_makespan, 0);
    assert!(log.is_empty());
}

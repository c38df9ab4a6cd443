//! Orchestrator - one planning request in, one complete report out
//!
//! See `engine.rs` for the pipeline.

pub mod engine;
pub mod fingerprint;

pub use engine::{
    EngineConfig, FactoryComparison, MonteCarloOverrides, PlanningError, PlanningReport,
    PlanningRequest, RankedScenario, ScenarioComparison, ScenarioMetrics, ScenarioOrchestrator,
    ScenarioResult,
};
pub use fingerprint::fingerprint;

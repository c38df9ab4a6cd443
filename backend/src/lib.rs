//! KPI Forecast Core - Rust Engine
//!
//! Forecasts how planned actions move a portfolio of KPIs across factories,
//! under uncertainty, with deterministic execution for a fixed seed.
//!
//! # Architecture
//!
//! - **core**: Quarter periods and rollover arithmetic
//! - **rng**: Deterministic random number generation
//! - **models**: KPIs, actions, scenarios, diagnostics
//! - **stats**: Trend, seasonality, anomalies, correlation, forecast
//! - **profile**: Per-KPI, per-factory performance profiles
//! - **projection**: Scenario-driven KPI trajectories
//! - **simulation**: Outcome evaluator, Monte Carlo, sensitivity
//! - **sequencing**: Action priority, resource conflicts, dependencies
//! - **risk**: Plan risk factors and mitigations
//! - **orchestrator**: One request in, one complete report out
//!
//! # Critical Invariants
//!
//! 1. Short histories degrade to neutral results, never errors
//! 2. All randomness is deterministic (seeded RNG, reported seed)
//! 3. The core performs no I/O; inputs are read-only snapshots
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod profile;
pub mod projection;
pub mod risk;
pub mod rng;
pub mod sequencing;
pub mod simulation;
pub mod stats;

// Re-exports for convenience
pub use core::{Period, PeriodError};
pub use models::{
    Action, DiagnosticKind, DiagnosticLog, Factory, Kpi, KpiSeries, Observation, Scenario,
    ScenarioAction, ScenarioAssumption,
};
pub use orchestrator::{
    EngineConfig, PlanningError, PlanningReport, PlanningRequest, ScenarioOrchestrator,
};
pub use rng::RngManager;
pub use simulation::CancellationToken;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn kpi_forecast_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::orchestrator::PyPlanningEngine>()?;
    Ok(())
}

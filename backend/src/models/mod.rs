//! Data model for the planning engine
//!
//! Inputs are read-only snapshots handed over by the data layer. Everything
//! the engine derives from them is an immutable value object recomputed per
//! request.

pub mod action;
pub mod diagnostics;
pub mod kpi;
pub mod prepared;
pub mod scenario;

// Re-exports
pub use action::{Action, ActionCatalogue, KpiImpact};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLog, Exclusion};
pub use kpi::{Factory, Kpi, KpiSeries, Observation};
pub use prepared::{PlannedAction, PreparedScenario};
pub use scenario::{
    check_probability_sum, AssumptionCategory, Scenario, ScenarioAction, ScenarioAssumption,
};

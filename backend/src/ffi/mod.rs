//! Python bindings (feature `pyo3`)
//!
//! JSON strings cross the boundary in both directions; the Python side never
//! sees Rust types.

pub mod orchestrator;

pub use orchestrator::PyPlanningEngine;

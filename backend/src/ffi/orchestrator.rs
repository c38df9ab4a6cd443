//! PyO3 wrapper for the scenario orchestrator

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::orchestrator::{EngineConfig, PlanningError, PlanningRequest, ScenarioOrchestrator};

/// Python wrapper for [`ScenarioOrchestrator`]
///
/// # Example (from Python)
///
/// ```python
/// from kpi_forecast_core_rs import PlanningEngine
///
/// engine = PlanningEngine('{"monte_carlo": {"iterations": 500, "seed": 42}}')
/// report = json.loads(engine.run(json.dumps(request)))
/// print(report["scenario_comparison"]["best_scenario"])
/// ```
#[pyclass(name = "PlanningEngine")]
pub struct PyPlanningEngine {
    inner: ScenarioOrchestrator,
}

#[pymethods]
impl PyPlanningEngine {
    /// Create an engine from an optional JSON configuration
    ///
    /// # Errors
    ///
    /// Raises ValueError if the configuration is not valid JSON for
    /// `EngineConfig`.
    #[new]
    #[pyo3(signature = (config_json = None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => serde_json::from_str::<EngineConfig>(json)
                .map_err(|e| PyValueError::new_err(format!("Invalid engine config: {}", e)))?,
            None => EngineConfig::default(),
        };
        Ok(Self {
            inner: ScenarioOrchestrator::new(config),
        })
    }

    /// Run one planning request and return the report as JSON
    ///
    /// The GIL is released while the engine runs.
    ///
    /// # Errors
    ///
    /// Raises ValueError for malformed or structurally invalid requests and
    /// RuntimeError for anything else.
    fn run(&self, py: Python<'_>, request_json: &str) -> PyResult<String> {
        let request: PlanningRequest = serde_json::from_str(request_json)
            .map_err(|e| PyValueError::new_err(format!("Invalid planning request: {}", e)))?;

        let report = py
            .allow_threads(|| self.inner.run(&request))
            .map_err(to_py_err)?;

        serde_json::to_string(&report)
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize report: {}", e)))
    }

    /// Fingerprint of a request without running it
    fn fingerprint(&self, request_json: &str) -> PyResult<String> {
        let request: PlanningRequest = serde_json::from_str(request_json)
            .map_err(|e| PyValueError::new_err(format!("Invalid planning request: {}", e)))?;
        crate::orchestrator::fingerprint(&request)
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to fingerprint request: {}", e)))
    }
}

fn to_py_err(err: PlanningError) -> PyErr {
    match err {
        PlanningError::Cancelled { .. } | PlanningError::Serialization(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
        _ => PyValueError::new_err(err.to_string()),
    }
}

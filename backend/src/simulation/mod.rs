//! Outcome simulation under parameter uncertainty
//!
//! - **evaluator**: the one pure "perturb parameters, recompute ROI" function
//! - **monte_carlo**: seeded random resampling, batched and parallel
//! - **sensitivity**: one-parameter-at-a-time variation sweeps
//!
//! Monte Carlo and sensitivity never duplicate outcome arithmetic; both build a
//! [`Perturbation`] and hand it to [`OutcomeEvaluator`].

pub mod evaluator;
pub mod monte_carlo;
pub mod sensitivity;

pub use evaluator::{
    EvaluationConfig, OutcomeEvaluator, Perturbation, PortfolioOutcome, ScenarioOutcome,
};
pub use monte_carlo::{
    CancellationToken, ConfidenceInterval, HistogramBin, MonteCarloConfig, MonteCarloError,
    MonteCarloResult, MonteCarloSimulator,
};
pub use sensitivity::{
    ParameterSensitivity, SensitivityAnalyzer, SensitivityConfig, SensitivityLabel,
    SensitivityParameter, SensitivityPoint, SensitivityResult, SensitivitySpec,
};

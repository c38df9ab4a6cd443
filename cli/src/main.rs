//! Batch runner: planning request JSON in, report JSON out
//!
//! # Examples
//!
//! ```bash
//! kpi-forecast --request request.json
//! kpi-forecast --request request.json --config engine.json --seed 42 --iterations 5000
//! RUST_LOG=debug kpi-forecast --request request.json --compact
//! ```
//!
//! Logs go to stderr as JSON (filter with `RUST_LOG`); stdout carries only
//! the report.

use anyhow::{Context, Result};
use clap::Parser;
use kpi_forecast_core_rs::orchestrator::{
    EngineConfig, MonteCarloOverrides, PlanningRequest, ScenarioOrchestrator,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Run a KPI planning request and print the report as JSON
#[derive(Parser, Debug)]
#[command(name = "kpi-forecast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Planning request JSON
    #[arg(long)]
    request: PathBuf,

    /// Engine configuration JSON (default: built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monte Carlo seed (overrides request and config)
    #[arg(long)]
    seed: Option<u64>,

    /// Monte Carlo iterations (overrides request and config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    iterations: Option<u64>,

    /// Print the report on one line
    #[arg(long)]
    compact: bool,
}

impl Cli {
    /// Fold `--seed` / `--iterations` into the request's Monte Carlo overrides
    fn apply_overrides(&self, request: &mut PlanningRequest) -> Result<()> {
        if self.seed.is_none() && self.iterations.is_none() {
            return Ok(());
        }
        let overrides = request
            .monte_carlo
            .get_or_insert_with(MonteCarloOverrides::default);
        if let Some(seed) = self.seed {
            overrides.seed = Some(seed);
        }
        if let Some(iterations) = self.iterations {
            overrides.iterations =
                Some(usize::try_from(iterations).context("--iterations does not fit in usize")?);
        }
        Ok(())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let raw = fs::read_to_string(&cli.request)
        .with_context(|| format!("reading request {}", cli.request.display()))?;
    let mut request: PlanningRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing request {}", cli.request.display()))?;

    let config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<EngineConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    cli.apply_overrides(&mut request)?;

    tracing::info!(request = %cli.request.display(), "running planning request");
    let report = ScenarioOrchestrator::new(config)
        .run(&request)
        .context("planning run failed")?;

    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}

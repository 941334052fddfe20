//! Engine binary for the Contagion simulation.
//!
//! This is the main entry point that wires together configuration, network
//! construction, seed selection, and the tick loop. It loads configuration,
//! builds the network, resolves the seeding schedule, and runs diffusion
//! until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `contagion-config.yaml` (or `CONTAGION_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate the configuration
//! 4. Build population, news items, and trust graph
//! 5. Resolve seeding entries into a schedule
//! 6. Run the simulation loop
//! 7. Log the result and export the cascade history

mod error;
mod seeding;
mod setup;

use std::path::Path;

use contagion_core::config::{LoggingConfig, SimulationConfig};
use contagion_core::control::RunControl;
use contagion_core::history::CascadeHistory;
use contagion_core::runner::{self, NoOpObserver};
use contagion_core::tick::DiffusionEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        run_name = config.run.name,
        seed = config.run.seed,
        max_ticks = config.run.max_ticks,
        "contagion-engine starting"
    );

    // 3. Validate.
    config.validate().map_err(EngineError::from)?;
    info!(
        agents = config.population.agents,
        news = config.news.len(),
        edges = config.network.edges.len(),
        seeding_entries = config.seeding.len(),
        "Configuration loaded"
    );

    // 4. Build the network.
    let mut network = setup::build_network(&config).map_err(EngineError::from)?;

    // 5. Resolve seeding.
    let schedule = seeding::resolve_schedule(&config, &network)?;

    // 6. Run.
    let engine = DiffusionEngine::with_workers(config.run.worker_threads);
    let control = RunControl::from_config(&config.run);
    let result = runner::run(&mut network, &engine, &control, schedule, &mut NoOpObserver)
        .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_run_end(&result);
    if let Some(path) = &config.run.history_path {
        write_history(&result.history, path)?;
        info!(path = %path.display(), ticks = result.history.len(), "Cascade history written");
    }

    info!(
        outcome = ?result.outcome,
        ticks = result.ticks,
        "contagion-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration.
///
/// Uses the file named by `CONTAGION_CONFIG`, else `contagion-config.yaml`
/// in the working directory. A missing file means defaults.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = SimulationConfig::config_path();
    if config_path.exists() {
        Ok(SimulationConfig::from_file(&config_path)?)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Write the cascade history as JSON.
fn write_history(history: &CascadeHistory, path: &Path) -> Result<(), EngineError> {
    let json = history.to_json().map_err(|e| EngineError::History {
        message: format!("failed to serialize history: {e}"),
    })?;
    std::fs::write(path, json).map_err(|e| EngineError::History {
        message: format!("failed to write {}: {e}", path.display()),
    })
}

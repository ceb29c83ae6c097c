//! Engine binary for the Cellforge population engine.
//!
//! Wires configuration, logging, the population, and the tick cycle
//! together and runs ticks until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `cellforge-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Restore prior state, or create a fresh population with its initial
//!    children
//! 4. Assemble the simulation state and register capabilities
//! 5. Run ticks on a fixed interval until `max_ticks` or Ctrl-C
//! 6. Persist the state and export the compliance report

mod error;

use std::path::Path;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cellforge_core::capability::{EthicalGuard, SelfAwareness};
use cellforge_core::config::{LogFormat, LoggingConfig, SimulationConfig};
use cellforge_core::environment::EnvironmentReading;
use cellforge_core::{PopulationError, PopulationManager, SimulationState, run_tick};

use crate::error::EngineError;

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "cellforge-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, restore, a tick, or the shutdown
/// writes fail.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        max_ticks = config.world.max_ticks,
        "Configuration loaded"
    );

    // 3. Restore or create the population.
    let population = load_population(&config)?;
    info!(
        root_id = %population.root().id(),
        entities = population.len(),
        generation = population.generation(),
        "Population ready"
    );

    // 4. Assemble simulation state.
    let mut state = SimulationState::new(&config, population)?;
    state.register(Box::new(SelfAwareness::new()));
    state.register(Box::new(EthicalGuard::default()));

    // 5. Run the tick loop.
    let outcome = run_loop(&mut state, &config).await;
    if let Err(e) = &outcome {
        warn!(error = %e, "Tick loop aborted, saving state before exit");
    }

    // 6. Persist and export.
    shutdown(&state, &config)?;
    outcome
}

/// Load `cellforge-config.yaml` if present, otherwise defaults with
/// environment overrides applied. The result is validated either way.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = Path::new(CONFIG_FILE);
    let config = if path.exists() {
        SimulationConfig::from_file(path)?
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        config
    };
    config.validate()?;
    Ok(config)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Restore from the configured state file, or start fresh when there is
/// none. A malformed file aborts startup rather than being overwritten.
fn load_population(config: &SimulationConfig) -> Result<PopulationManager, EngineError> {
    if let Some(path) = &config.storage.state_path {
        match PopulationManager::restore(config, path) {
            Ok(population) => return Ok(population),
            Err(PopulationError::NotFound { .. }) => {
                info!(path = %path.display(), "No saved state, starting fresh");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut population = PopulationManager::new(config);
    for _ in 0..config.population.initial_children {
        population.spawn_child();
    }
    Ok(population)
}

/// Run ticks every `tick_interval_ms` until `max_ticks` (0 = unbounded) or
/// Ctrl-C.
async fn run_loop(state: &mut SimulationState, config: &SimulationConfig) -> Result<(), EngineError> {
    let mut interval = tokio::time::interval(Duration::from_millis(config.world.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut readings = config
        .world
        .seed
        .map_or_else(StdRng::from_os_rng, |s| StdRng::seed_from_u64(s.wrapping_add(2)));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering tick loop");
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!(tick = state.tick, "Ctrl-C received");
                return Ok(());
            }
        }

        let reading = EnvironmentReading::sample(&mut readings);
        let report = run_tick(state, Some(&reading))?;

        if config.world.max_ticks > 0 && report.tick >= config.world.max_ticks {
            info!(tick = report.tick, max_ticks = config.world.max_ticks, "Tick limit reached");
            return Ok(());
        }
    }
}

/// Final persistence and compliance export.
fn shutdown(state: &SimulationState, config: &SimulationConfig) -> Result<(), EngineError> {
    let population = &state.population;
    if !population.persist()? {
        info!("No state path configured, state not saved");
    }

    let verdict = population.compliance_verdict();
    info!(
        compliant = verdict.compliant,
        violations = verdict.violations.len(),
        records = population.compliance().len(),
        "Compliance verdict"
    );
    if let Some(path) = &config.storage.compliance_path {
        population.compliance().export(path)?;
        info!(path = %path.display(), "Compliance report exported");
    }

    info!(
        total_ticks = state.tick,
        entities = population.len(),
        generation = population.generation(),
        "cellforge-engine shutdown complete"
    );
    Ok(())
}

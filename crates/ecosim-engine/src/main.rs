//! Headless engine binary for the ecosystem simulation.
//!
//! Loads configuration, starts the simulation clock, and runs until a
//! termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$ECOSIM_CONFIG` or `ecosim-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Validate configuration
//! 4. Build the clock and register the log observer
//! 5. Start the worker and wait for the tick limit, the time limit, or
//!    Ctrl-C
//! 6. Stop the worker and log the final census

mod error;
mod observer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ecosim_core::{SimulationClock, SimulationConfig};
use ecosim_types::SimulationData;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer::LogObserver;

/// Environment variable naming the configuration file.
const CONFIG_ENV_VAR: &str = "ECOSIM_CONFIG";

/// Configuration file used when `ECOSIM_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "ecosim-config.yaml";

/// Ticks between population log lines.
const REPORT_INTERVAL: u64 = 50;

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndReason {
    /// Reached `simulation.max_ticks`.
    MaxTicksReached,
    /// Reached `simulation.max_real_time_seconds`.
    MaxRealTimeReached,
    /// Ctrl-C.
    Interrupted,
}

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the worker fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("ecosim-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Validate configuration.
    config.validate()?;
    info!(
        world_width = config.ecosystem.world_width,
        world_height = config.ecosystem.world_height,
        initial_grass = config.ecosystem.initial_grass,
        initial_cows = config.ecosystem.initial_cows,
        initial_tigers = config.ecosystem.initial_tigers,
        seed = ?config.seed,
        target_rate = config.clock.target_rate,
        "Configuration validated"
    );

    // 4. Build the clock.
    let bounds = config.simulation.clone();
    let clock = SimulationClock::new(config);
    clock
        .set_observer(Arc::new(LogObserver::new(REPORT_INTERVAL)))
        .await;
    let updates = clock.subscribe();

    // 5. Run until a boundary is hit.
    clock.start().await;
    let reason = tokio::select! {
        () = wait_for_ticks(updates, bounds.max_ticks) => EndReason::MaxTicksReached,
        () = wait_for_seconds(bounds.max_real_time_seconds) => EndReason::MaxRealTimeReached,
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|source| EngineError::Signal { source })?;
            EndReason::Interrupted
        }
    };
    info!(?reason, "Stopping simulation");

    // 6. Stop and report.
    let report = clock.stop().await?;
    let data = clock.get_data().await;
    log_final_census(&data, report.map_or(0, |r| r.ticks));
    for (species, stats) in clock.statistics().await {
        info!(
            %species,
            alive = stats.alive,
            mean_energy = stats.mean_energy,
            mean_age = stats.mean_age,
            "Species statistics"
        );
    }

    info!(?reason, "ecosim-engine shutdown complete");
    Ok(())
}

/// Load configuration from `$ECOSIM_CONFIG`, else `ecosim-config.yaml`,
/// else defaults. Returns the path actually read, if any.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let config_path = std::env::var_os(CONFIG_ENV_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if config_path.exists() {
        let config = SimulationConfig::from_file(&config_path)?;
        Ok((config, Some(config_path)))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        Ok((config, None))
    }
}

/// Resolve once the published time step reaches `max_ticks`. Never
/// resolves when `max_ticks` is 0.
async fn wait_for_ticks(mut updates: watch::Receiver<Arc<SimulationData>>, max_ticks: u64) {
    if max_ticks == 0 {
        return std::future::pending().await;
    }
    loop {
        if updates.borrow_and_update().ecosystem.time_step >= max_ticks {
            return;
        }
        if updates.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

/// Resolve after `seconds` of wall-clock time. Never resolves when
/// `seconds` is 0.
async fn wait_for_seconds(seconds: u64) {
    if seconds == 0 {
        return std::future::pending().await;
    }
    tokio::time::sleep(Duration::from_secs(seconds)).await;
}

fn log_final_census(data: &SimulationData, worker_ticks: u64) {
    let eco = &data.ecosystem;
    info!(
        time_step = eco.time_step,
        worker_ticks,
        grass = eco.counts.grass,
        cow = eco.counts.cow,
        tiger = eco.counts.tiger,
        births = eco.births.total(),
        deaths = eco.deaths.total(),
        "Final census"
    );
}

//! The simulation clock: a controllable background stepper.
//!
//! [`SimulationClock`] owns an [`Ecosystem`] behind a mutex and drives it
//! from a spawned worker task at `target_rate * speed` ticks per second.
//! It is the only public entry point the outer layers (dashboards, HTTP
//! adapters, the headless engine) need.
//!
//! # States
//!
//! - **Stopped** -- no worker. [`step`](SimulationClock::step) is allowed.
//! - **Running** -- a worker ticks continuously. Manual stepping is
//!   rejected.
//! - **Running, paused** -- the worker is alive but skips tick bodies.
//!
//! Readers never see a partially applied tick: the worker holds the
//! ecosystem lock for the whole tick, and every read model is an owned
//! deep copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use ecosim_types::{SimulationData, Species, SpeciesStatistics};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::control::ClockControl;
use crate::ecosystem::Ecosystem;
use crate::runner::{self, ClockObserver, NoOpObserver, Shared, WorkerReport};
use crate::tick::TickSummary;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The worker task panicked or was cancelled.
    #[error("clock worker failed: {source}")]
    Worker {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

/// Background stepper around an [`Ecosystem`].
pub struct SimulationClock {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<WorkerReport>>>,
    config: RwLock<SimulationConfig>,
}

impl std::fmt::Debug for SimulationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationClock")
            .field("running", &self.is_running())
            .field("paused", &self.is_paused())
            .field("speed", &self.speed())
            .finish_non_exhaustive()
    }
}

impl SimulationClock {
    /// Build a stopped clock around a freshly populated ecosystem.
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_ecosystem(Ecosystem::new(config))
    }

    /// Build a stopped clock around an existing ecosystem.
    ///
    /// The clock adopts the ecosystem's configuration as its stored
    /// configuration.
    pub fn with_ecosystem(ecosystem: Ecosystem) -> Self {
        let config = ecosystem.config().clone();
        let control = ClockControl::new(config.clock.target_rate, config.clock.initial_speed);
        let initial = SimulationData {
            ecosystem: ecosystem.snapshot(),
            running: false,
            paused: false,
            speed: control.speed(),
            captured_at: chrono::Utc::now(),
        };
        let (publisher, _) = watch::channel(Arc::new(initial));
        let observer: Arc<dyn ClockObserver> = Arc::new(NoOpObserver);

        Self {
            shared: Arc::new(Shared {
                ecosystem: Mutex::new(ecosystem),
                control,
                observer: RwLock::new(observer),
                publisher,
            }),
            worker: Mutex::new(None),
            config: RwLock::new(config),
        }
    }

    // -----------------------------------------------------------------------
    // Run control
    // -----------------------------------------------------------------------

    /// Spawn the worker. Returns `false` if the clock was already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(&self) -> bool {
        let mut worker = self.worker.lock().await;
        if !self.shared.control.begin_run() {
            return false;
        }
        // A handle left behind by a worker that died on its own.
        if let Some(stale) = worker.take() {
            if let Err(err) = stale.await {
                warn!(error = %err, "Previous clock worker failed");
            }
        }
        info!(
            speed = self.shared.control.speed(),
            target_rate = self.shared.control.target_rate(),
            "Clock started"
        );
        *worker = Some(tokio::spawn(runner::run_worker(Arc::clone(&self.shared))));
        true
    }

    /// Skip tick bodies until resumed. No-op unless running.
    pub fn pause(&self) {
        if self.shared.control.is_running() && !self.shared.control.is_paused() {
            self.shared.control.pause();
            info!("Clock paused");
        }
    }

    /// Resume ticking. No-op unless paused.
    pub fn resume(&self) {
        if self.shared.control.is_paused() {
            self.shared.control.resume();
            info!("Clock resumed");
        }
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Returns the worker's report, or `None` if the clock was not running.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Worker`] if the worker task panicked.
    pub async fn stop(&self) -> Result<Option<WorkerReport>, ClockError> {
        let mut worker = self.worker.lock().await;
        let Some(handle) = worker.take() else {
            return Ok(None);
        };
        self.shared.control.request_stop();
        let joined = handle.await;
        self.shared.control.end_run();
        let report = joined?;
        info!(ticks = report.ticks, "Clock stopped");
        Ok(Some(report))
    }

    /// Reinitialise the ecosystem, optionally under a new configuration.
    ///
    /// Stops the worker if it is running, resets the ecosystem from the
    /// supplied configuration (or the stored one, including any change made
    /// through [`update_config`](Self::update_config)), publishes the fresh
    /// state, and restarts the worker if it was running before.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Worker`] if stopping the worker failed.
    pub async fn reset(&self, config: Option<SimulationConfig>) -> Result<(), ClockError> {
        let was_running = self.is_running();
        self.stop().await?;

        let config = {
            let mut stored = self.config.write().await;
            if let Some(config) = config {
                *stored = config;
            }
            stored.clone()
        };
        self.shared.control.set_target_rate(config.clock.target_rate);

        {
            let mut ecosystem = self.shared.ecosystem.lock().await;
            ecosystem.reset(Some(config));
            let data = self.shared.capture(&ecosystem);
            self.shared.publish(data);
        }
        info!("Clock reset");

        if was_running {
            self.start().await;
        }
        Ok(())
    }

    /// Run exactly one tick on the calling task.
    ///
    /// Rejected with `None` while the worker is running. Holds the worker
    /// slot for the whole tick, so a concurrent [`start`](Self::start)
    /// waits for the manual tick to commit.
    pub async fn step(&self) -> Option<TickSummary> {
        let _worker = self.worker.lock().await;
        if self.is_running() {
            warn!("Manual step rejected while the clock is running");
            return None;
        }
        let mut ecosystem = self.shared.ecosystem.lock().await;
        let summary = ecosystem.step();
        let data = self.shared.capture(&ecosystem);
        self.shared.publish(data);
        Some(summary)
    }

    /// Set the speed multiplier, clamped to `[0.1, 5.0]`. Returns the
    /// stored value.
    pub fn set_speed(&self, speed: f64) -> f64 {
        let stored = self.shared.control.set_speed(speed);
        info!(requested = speed, speed = stored, "Clock speed changed");
        stored
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    /// Whether a worker is alive.
    pub fn is_running(&self) -> bool {
        self.shared.control.is_running()
    }

    /// Whether the worker is skipping tick bodies.
    pub fn is_paused(&self) -> bool {
        self.shared.control.is_paused()
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        self.shared.control.speed()
    }

    /// Point-in-time deep copy of the ecosystem and clock flags.
    pub async fn get_data(&self) -> SimulationData {
        let ecosystem = self.shared.ecosystem.lock().await;
        self.shared.capture(&ecosystem)
    }

    /// Alive count, mean energy and mean age per species.
    pub async fn statistics(&self) -> BTreeMap<Species, SpeciesStatistics> {
        self.shared.ecosystem.lock().await.statistics()
    }

    /// Receive the snapshot of every committed tick.
    ///
    /// The channel keeps only the latest value, so a slow subscriber skips
    /// intermediate ticks instead of slowing the clock.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SimulationData>> {
        self.shared.publisher.subscribe()
    }

    /// Register the observer invoked by the worker after each tick.
    pub async fn set_observer(&self, observer: Arc<dyn ClockObserver>) {
        *self.shared.observer.write().await = observer;
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// The stored configuration.
    pub async fn config(&self) -> SimulationConfig {
        self.config.read().await.clone()
    }

    /// Replace the stored configuration without touching the population.
    ///
    /// The new cadence applies from the next sleep. World size, initial
    /// counts and the behaviour table take effect at the next
    /// [`reset`](Self::reset); until then the live population and the
    /// stored configuration may disagree.
    pub async fn update_config(&self, config: SimulationConfig) {
        self.shared.control.set_target_rate(config.clock.target_rate);
        *self.config.write().await = config;
        info!("Clock configuration updated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use super::*;

    fn config(grass: u32, cows: u32, tigers: u32) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.ecosystem.initial_grass = grass;
        config.ecosystem.initial_cows = cows;
        config.ecosystem.initial_tigers = tigers;
        config.clock.target_rate = 200.0;
        config.seed = Some(7);
        config
    }

    #[derive(Default)]
    struct Counting {
        updates: AtomicU64,
        extinctions: AtomicU64,
    }

    impl ClockObserver for Counting {
        fn on_update(&self, _data: &SimulationData) {
            self.updates.fetch_add(1, Ordering::Relaxed);
        }

        fn on_extinction(&self, _species: &[Species]) {
            self.extinctions.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn step_advances_while_stopped() {
        let clock = SimulationClock::new(config(10, 2, 1));
        let summary = clock.step().await.unwrap();
        assert_eq!(summary.tick, 0);
        let data = clock.get_data().await;
        assert_eq!(data.ecosystem.time_step, 1);
        assert!(!data.running);
    }

    #[tokio::test]
    async fn step_is_rejected_while_running() {
        let clock = SimulationClock::new(config(10, 2, 1));
        assert!(clock.start().await);
        assert!(clock.step().await.is_none());
        clock.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_twice_is_a_no_op() {
        let clock = SimulationClock::new(config(0, 0, 0));
        assert!(clock.start().await);
        assert!(!clock.start().await);
        assert!(clock.is_running());
        let report = clock.stop().await.unwrap();
        assert!(report.is_some());
        assert!(!clock.is_running());
        assert!(clock.stop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn worker_ticks_and_notifies() {
        let clock = SimulationClock::new(config(5, 1, 0));
        let observer = Arc::new(Counting::default());
        clock.set_observer(observer.clone()).await;
        clock.set_speed(5.0);

        clock.start().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        let report = clock.stop().await.unwrap().unwrap();

        assert!(report.ticks > 0);
        assert_eq!(observer.updates.load(Ordering::Relaxed), report.ticks);
        // Tigers were absent from the start and are reported once.
        assert!(observer.extinctions.load(Ordering::Relaxed) >= 1);
        assert_eq!(clock.get_data().await.ecosystem.time_step, report.ticks);
    }

    #[tokio::test]
    async fn paused_worker_does_not_tick() {
        let clock = SimulationClock::new(config(5, 1, 1));
        clock.start().await;
        clock.pause();
        assert!(clock.is_paused());
        // Let any in-flight tick settle before sampling.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let before = clock.get_data().await.ecosystem.time_step;
        tokio::time::sleep(Duration::from_millis(60)).await;
        let after = clock.get_data().await.ecosystem.time_step;
        assert_eq!(before, after);

        clock.resume();
        assert!(!clock.is_paused());
        clock.stop().await.unwrap();
        assert!(!clock.is_paused());
    }

    #[tokio::test]
    async fn pause_is_ignored_while_stopped() {
        let clock = SimulationClock::new(config(0, 0, 0));
        clock.pause();
        assert!(!clock.is_paused());
    }

    #[tokio::test]
    async fn set_speed_clamps() {
        let clock = SimulationClock::new(config(0, 0, 0));
        assert!((clock.set_speed(0.01) - 0.1).abs() < f64::EPSILON);
        assert!((clock.set_speed(10.0) - 5.0).abs() < f64::EPSILON);
        assert!((clock.set_speed(1.5) - 1.5).abs() < f64::EPSILON);
        assert!((clock.get_data().await.speed - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn reset_restores_configured_counts() {
        let clock = SimulationClock::new(config(10, 3, 1));
        for _ in 0..5 {
            clock.step().await;
        }
        clock.reset(Some(config(4, 2, 0))).await.unwrap();
        let data = clock.get_data().await;
        assert_eq!(data.ecosystem.time_step, 0);
        assert!(data.ecosystem.population_history.is_empty());
        assert_eq!(data.ecosystem.counts.grass, 4);
        assert_eq!(data.ecosystem.counts.cow, 2);
        assert_eq!(data.ecosystem.counts.tiger, 0);
    }

    #[tokio::test]
    async fn reset_restarts_a_running_clock() {
        let clock = SimulationClock::new(config(10, 3, 1));
        clock.start().await;
        clock.reset(None).await.unwrap();
        assert!(clock.is_running());
        clock.stop().await.unwrap();
    }

    #[tokio::test]
    async fn update_config_defers_population_changes_to_reset() {
        let clock = SimulationClock::new(config(10, 3, 1));
        clock.update_config(config(1, 1, 1)).await;
        assert_eq!(clock.get_data().await.ecosystem.counts.grass, 10);
        assert_eq!(clock.config().await.ecosystem.initial_grass, 1);

        clock.reset(None).await.unwrap();
        assert_eq!(clock.get_data().await.ecosystem.counts.grass, 1);
    }

    struct Exploding;

    impl ClockObserver for Exploding {
        #[allow(clippy::panic)]
        fn on_update(&self, _data: &SimulationData) {
            panic!("observer failure");
        }
    }

    #[tokio::test]
    async fn dead_worker_releases_the_clock() {
        let clock = SimulationClock::new(config(5, 1, 1));
        clock.set_observer(Arc::new(Exploding)).await;
        assert!(clock.start().await);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!clock.is_running());
        assert!(!clock.get_data().await.running);
        assert!(clock.step().await.is_some());

        clock.set_observer(Arc::new(NoOpObserver)).await;
        assert!(clock.start().await);
        assert!(clock.is_running());
        clock.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_surfaces_a_worker_panic() {
        let clock = SimulationClock::new(config(5, 1, 1));
        clock.set_observer(Arc::new(Exploding)).await;
        clock.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(clock.stop().await, Err(ClockError::Worker { .. })));
        assert!(clock.stop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn step_waits_for_the_worker_slot() {
        let clock = Arc::new(SimulationClock::new(config(5, 1, 1)));
        let slot = clock.worker.lock().await;
        let stepper = tokio::spawn({
            let clock = Arc::clone(&clock);
            async move { clock.step().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!stepper.is_finished());
        assert_eq!(clock.get_data().await.ecosystem.time_step, 0);

        drop(slot);
        let summary = stepper.await.unwrap();
        assert!(summary.is_some());
        assert_eq!(clock.get_data().await.ecosystem.time_step, 1);
    }

    #[tokio::test]
    async fn statistics_reflect_the_live_population() {
        let clock = SimulationClock::new(config(6, 2, 0));
        let stats = clock.statistics().await;
        assert_eq!(stats[&Species::Grass].alive, 6);
        assert_eq!(stats[&Species::Cow].alive, 2);
        assert_eq!(stats[&Species::Tiger].alive, 0);
    }

    #[tokio::test]
    async fn subscribers_see_committed_ticks() {
        let clock = SimulationClock::new(config(10, 2, 1));
        let mut rx = clock.subscribe();
        assert_eq!(rx.borrow_and_update().ecosystem.time_step, 0);
        clock.step().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().ecosystem.time_step, 1);
    }
}

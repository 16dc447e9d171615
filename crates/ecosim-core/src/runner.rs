//! Background stepping worker and its observer hooks.
//!
//! [`run_worker`] is the loop spawned by
//! [`SimulationClock::start`](crate::clock::SimulationClock::start). Each
//! cycle it checks for a stop request, runs one tick unless paused,
//! publishes the committed snapshot, notifies the observer, and sleeps for
//! `(1 / target_rate) / speed`. The ecosystem lock is held only for the
//! tick and the snapshot copy; observers run after it is released.
//!
//! Observer calls are synchronous on the worker task, so a slow observer
//! delays the next tick. Consumers that must not throttle the clock should
//! use [`SimulationClock::subscribe`](crate::clock::SimulationClock::subscribe)
//! instead.

use std::sync::Arc;

use chrono::Utc;
use ecosim_types::{SimulationData, Species};
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, info};

use crate::control::ClockControl;
use crate::ecosystem::Ecosystem;

/// Hooks invoked by the worker after each committed tick.
pub trait ClockObserver: Send + Sync {
    /// Called with the snapshot of every committed tick.
    fn on_update(&self, data: &SimulationData) {
        let _ = data;
    }

    /// Called with species that went extinct since the last notification.
    fn on_extinction(&self, species: &[Species]) {
        let _ = species;
    }
}

/// An observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl ClockObserver for NoOpObserver {}

/// State shared between the clock facade and its worker.
pub(crate) struct Shared {
    /// The ecosystem. Locked for the duration of a tick.
    pub ecosystem: Mutex<Ecosystem>,
    /// Flags and cadence.
    pub control: ClockControl,
    /// The registered observer.
    pub observer: RwLock<Arc<dyn ClockObserver>>,
    /// Latest committed snapshot.
    pub publisher: watch::Sender<Arc<SimulationData>>,
}

impl Shared {
    /// Deep copy of the ecosystem plus the current clock flags.
    pub fn capture(&self, ecosystem: &Ecosystem) -> SimulationData {
        SimulationData {
            ecosystem: ecosystem.snapshot(),
            running: self.control.is_running(),
            paused: self.control.is_paused(),
            speed: self.control.speed(),
            captured_at: Utc::now(),
        }
    }

    /// Publish a snapshot to subscribers.
    pub fn publish(&self, data: SimulationData) -> Arc<SimulationData> {
        let data = Arc::new(data);
        self.publisher.send_replace(Arc::clone(&data));
        data
    }
}

/// Reports which species went extinct since the previous observation.
///
/// A species that recovers and dies out again is reported again.
#[derive(Debug, Clone, Default)]
pub struct ExtinctionTracker {
    known: Vec<Species>,
}

impl ExtinctionTracker {
    /// Record the currently extinct species and return the new ones.
    pub fn observe(&mut self, extinct: &[Species]) -> Vec<Species> {
        let fresh = extinct
            .iter()
            .copied()
            .filter(|species| !self.known.contains(species))
            .collect();
        self.known = extinct.to_vec();
        fresh
    }
}

/// Outcome of one worker lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// Ticks executed by this worker.
    pub ticks: u64,
}

/// Marks the clock stopped when the worker exits, including by panic.
struct RunningGuard<'a>(&'a ClockControl);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.end_run();
    }
}

/// Run the stepping loop until a stop is requested.
pub(crate) async fn run_worker(shared: Arc<Shared>) -> WorkerReport {
    let _running = RunningGuard(&shared.control);
    let mut ticks: u64 = 0;
    let mut extinctions = ExtinctionTracker::default();

    info!(
        target_rate = shared.control.target_rate(),
        speed = shared.control.speed(),
        "Clock worker started"
    );

    loop {
        // --- Check stop request ---
        if shared.control.is_stop_requested() {
            break;
        }

        if !shared.control.is_paused() {
            // --- Execute tick ---
            let (data, extinct) = {
                let mut ecosystem = shared.ecosystem.lock().await;
                ecosystem.step();
                (shared.capture(&ecosystem), ecosystem.check_extinction())
            };
            ticks = ticks.saturating_add(1);
            let data = shared.publish(data);

            // --- Notify observer ---
            let observer = Arc::clone(&*shared.observer.read().await);
            observer.on_update(&data);

            // --- Check extinction ---
            let fresh = extinctions.observe(&extinct);
            if !fresh.is_empty() {
                info!(
                    time_step = data.ecosystem.time_step,
                    species = ?fresh,
                    "Species extinct"
                );
                observer.on_extinction(&fresh);
            }
        }

        // --- Sleep until the next cycle ---
        shared.control.sleep_cycle().await;
    }

    debug!(ticks, "Clock worker exiting");
    WorkerReport { ticks }
}

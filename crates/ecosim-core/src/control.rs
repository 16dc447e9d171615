//! Shared control state for the background stepping worker.
//!
//! The clock facade and its worker task share one [`ClockControl`] through
//! an [`Arc`](std::sync::Arc). Every field is an atomic or a [`Notify`], so
//! the worker reads its flags without locks and control calls never wait
//! on a tick in progress.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Slowest allowed speed multiplier.
pub const MIN_SPEED: f64 = 0.1;

/// Fastest allowed speed multiplier.
pub const MAX_SPEED: f64 = 5.0;

/// Clamp a requested speed multiplier to `[MIN_SPEED, MAX_SPEED]`.
///
/// `NaN` maps to [`MAX_SPEED`].
pub fn clamp_speed(speed: f64) -> f64 {
    speed.min(MAX_SPEED).max(MIN_SPEED)
}

/// Flags and tunables shared between the clock and its worker.
#[derive(Debug)]
pub struct ClockControl {
    /// Whether a worker is currently alive.
    running: AtomicBool,

    /// Whether the worker skips tick bodies.
    paused: AtomicBool,

    /// Whether the worker has been asked to exit.
    stop_requested: AtomicBool,

    /// Wakes the worker out of its inter-tick sleep.
    wake: Notify,

    /// Speed multiplier, stored as `f64` bits.
    speed_bits: AtomicU64,

    /// Ticks per second at speed 1.0, stored as `f64` bits.
    target_rate_bits: AtomicU64,
}

impl ClockControl {
    /// Create control state for a stopped clock.
    pub fn new(target_rate: f64, initial_speed: f64) -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            wake: Notify::new(),
            speed_bits: AtomicU64::new(clamp_speed(initial_speed).to_bits()),
            target_rate_bits: AtomicU64::new(target_rate.to_bits()),
        }
    }

    // -----------------------------------------------------------------------
    // Running
    // -----------------------------------------------------------------------

    /// Whether a worker is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Mark the clock as running. Returns `false` if it already was.
    pub fn begin_run(&self) -> bool {
        let started = self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if started {
            self.stop_requested.store(false, Ordering::Release);
            self.paused.store(false, Ordering::Release);
        }
        started
    }

    /// Mark the clock as stopped and clear the pause flag.
    pub fn end_run(&self) {
        self.running.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Release);
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether tick bodies are being skipped.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Skip tick bodies until resumed. The worker keeps cycling.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume ticking and cut the current sleep short.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.wake.notify_waiters();
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the worker to exit at its next check.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_waiters();
    }

    /// Whether the worker has been asked to exit.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Sleep for one cycle, returning early on stop or resume.
    ///
    /// Wake-ups sent while the worker was busy are not stored, so a stray
    /// resume never shortens a later sleep. A stop requested in that window
    /// is caught by the flag check after registering for wake-ups.
    pub async fn sleep_cycle(&self) {
        let woken = self.wake.notified();
        tokio::pin!(woken);
        woken.as_mut().enable();
        if self.is_stop_requested() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(self.interval()) => {}
            () = woken => {}
        }
    }

    // -----------------------------------------------------------------------
    // Cadence
    // -----------------------------------------------------------------------

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed_bits.load(Ordering::Acquire))
    }

    /// Store a clamped speed multiplier and return the stored value.
    pub fn set_speed(&self, speed: f64) -> f64 {
        let clamped = clamp_speed(speed);
        self.speed_bits.store(clamped.to_bits(), Ordering::Release);
        clamped
    }

    /// Ticks per second at speed 1.0.
    pub fn target_rate(&self) -> f64 {
        f64::from_bits(self.target_rate_bits.load(Ordering::Acquire))
    }

    /// Replace the base tick rate.
    pub fn set_target_rate(&self, rate: f64) {
        self.target_rate_bits.store(rate.to_bits(), Ordering::Release);
    }

    /// Sleep between cycles: `(1 / target_rate) / speed`.
    ///
    /// An unusable rate yields a zero interval.
    pub fn interval(&self) -> Duration {
        let seconds = (1.0 / self.target_rate()) / self.speed();
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }
}

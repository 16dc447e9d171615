//! Stepped predator-prey simulation engine.
//!
//! This crate owns the closed grass/cow/tiger ecosystem and the clock that
//! drives it. Each tick runs Update, Reproduction and Cleanup over the
//! population, then records statistics.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `ecosim-config.yaml` into
//!   strongly-typed structs, including the per-species behaviour table.
//! - [`entity`] -- The individual: shared lifecycle plus producer and
//!   animal behaviour.
//! - [`population`] -- Per-species registry and borrow-split
//!   [`Surroundings`](population::Surroundings).
//! - [`context`] -- Immutable per-phase [`TickContext`](context::TickContext).
//! - [`tick`] -- The tick phases.
//! - [`ecosystem`] -- [`Ecosystem`], the orchestrator with tallies and
//!   history.
//! - [`control`] -- Atomic flags shared with the worker.
//! - [`runner`] -- The background worker loop and [`ClockObserver`].
//! - [`clock`] -- [`SimulationClock`], the public control surface.
//!
//! [`Ecosystem`]: ecosystem::Ecosystem
//! [`ClockObserver`]: runner::ClockObserver
//! [`SimulationClock`]: clock::SimulationClock

pub mod clock;
pub mod config;
pub mod context;
pub mod control;
pub mod ecosystem;
pub mod entity;
pub mod population;
pub mod runner;
pub mod tick;

pub use clock::{ClockError, SimulationClock};
pub use config::{ConfigError, SimulationConfig};
pub use ecosystem::Ecosystem;
pub use entity::Entity;
pub use population::PopulationRegistry;
pub use runner::{ClockObserver, NoOpObserver};
pub use tick::TickSummary;

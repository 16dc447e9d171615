//! Shared type definitions for the ecosystem simulation.
//!
//! This crate holds the vocabulary shared by the engine and its consumers.
//! Snapshot types flow to `TypeScript` via `ts-rs` so a dashboard can
//! render them without hand-written bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for individuals
//! - [`enums`] -- [`Species`] tags and [`DeathCause`]
//! - [`position`] -- [`Position`] and [`WorldBounds`]
//! - [`snapshot`] -- Owned read models returned by `get_data`

pub mod enums;
pub mod ids;
pub mod position;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use enums::{DeathCause, Species};
pub use ids::EntityId;
pub use position::{Position, WorldBounds};
pub use snapshot::{
    EcosystemSnapshot, IndividualSnapshot, PopulationCounts, SimulationData, SpeciesStatistics,
    SpeciesTally,
};

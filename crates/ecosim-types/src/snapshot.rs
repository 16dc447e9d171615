//! Point-in-time read models handed to consumers outside the tick loop.
//!
//! Every type here is an owned deep copy. Holding one never pins engine
//! state, and no snapshot can reflect a partially-applied tick.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Species;
use crate::ids::EntityId;

/// Render-facing attributes of one living individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct IndividualSnapshot {
    /// Stable identifier of the individual.
    pub id: EntityId,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Current energy.
    pub energy: f64,
    /// Age in ticks.
    pub age: u32,
    /// Energy ceiling.
    pub max_energy: f64,
}

/// A per-species counter (births, deaths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpeciesTally {
    /// Count for grass.
    pub grass: u64,
    /// Count for cows.
    pub cow: u64,
    /// Count for tigers.
    pub tiger: u64,
}

impl SpeciesTally {
    /// Read the counter for one species.
    pub const fn get(&self, species: Species) -> u64 {
        match species {
            Species::Grass => self.grass,
            Species::Cow => self.cow,
            Species::Tiger => self.tiger,
        }
    }

    /// Add `amount` to the counter for one species (saturating).
    pub fn add(&mut self, species: Species, amount: u64) {
        let slot = match species {
            Species::Grass => &mut self.grass,
            Species::Cow => &mut self.cow,
            Species::Tiger => &mut self.tiger,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Sum over all species (saturating).
    pub const fn total(&self) -> u64 {
        self.grass.saturating_add(self.cow).saturating_add(self.tiger)
    }
}

/// Population counts for one tick, as stored in the history ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopulationCounts {
    /// Registered grass individuals.
    pub grass: u64,
    /// Registered cows.
    pub cow: u64,
    /// Registered tigers.
    pub tiger: u64,
    /// Sum of all species.
    pub total: u64,
}

impl PopulationCounts {
    /// Build counts from per-species values, computing the total.
    pub const fn new(grass: u64, cow: u64, tiger: u64) -> Self {
        Self {
            grass,
            cow,
            tiger,
            total: grass.saturating_add(cow).saturating_add(tiger),
        }
    }

    /// Read the count for one species.
    pub const fn get(&self, species: Species) -> u64 {
        match species {
            Species::Grass => self.grass,
            Species::Cow => self.cow,
            Species::Tiger => self.tiger,
        }
    }
}

/// Aggregate vitals for one species.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpeciesStatistics {
    /// Living individuals.
    pub alive: u64,
    /// Mean energy of the living individuals (0 when none).
    pub mean_energy: f64,
    /// Mean age of the living individuals (0 when none).
    pub mean_age: f64,
}

/// Deep copy of the ecosystem after a committed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EcosystemSnapshot {
    /// Living individuals per species, in registration order.
    pub individuals: BTreeMap<Species, Vec<IndividualSnapshot>>,
    /// Registered individuals per species.
    pub counts: PopulationCounts,
    /// Number of completed ticks.
    pub time_step: u64,
    /// Cumulative births since the last reset.
    pub births: SpeciesTally,
    /// Cumulative deaths since the last reset.
    pub deaths: SpeciesTally,
    /// Counts after each of the most recent ticks, oldest first.
    pub population_history: Vec<PopulationCounts>,
}

/// Everything `get_data` returns: the ecosystem plus clock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationData {
    /// The ecosystem snapshot.
    #[serde(flatten)]
    pub ecosystem: EcosystemSnapshot,
    /// Whether the background worker is running.
    pub running: bool,
    /// Whether the worker is skipping ticks.
    pub paused: bool,
    /// Current speed multiplier.
    pub speed: f64,
    /// When the snapshot was taken.
    pub captured_at: DateTime<Utc>,
}

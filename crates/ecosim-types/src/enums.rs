//! Enumeration types for the ecosystem simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

/// The three trophic tiers of the closed ecosystem.
///
/// The declaration order is also the processing order of every tick phase:
/// producers act first, then herbivores, then carnivores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Species {
    /// Producer. Grows in place and spreads by seeding.
    Grass,
    /// Herbivore. Grazes on grass.
    Cow,
    /// Carnivore. Hunts cows.
    Tiger,
}

impl Species {
    /// Every species, in tick processing order.
    pub const ALL: [Self; 3] = [Self::Grass, Self::Cow, Self::Tiger];

    /// Lowercase species name used in logs and serialized keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Cow => "cow",
            Self::Tiger => "tiger",
        }
    }

    /// The trophic role of this species ("producer", "herbivore", "carnivore").
    pub const fn trophic_role(self) -> &'static str {
        match self {
            Self::Grass => "producer",
            Self::Cow => "herbivore",
            Self::Tiger => "carnivore",
        }
    }

    /// Whether this species moves and forages (herbivores and carnivores).
    pub const fn is_animal(self) -> bool {
        matches!(self, Self::Cow | Self::Tiger)
    }
}

impl core::fmt::Display for Species {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Death
// ---------------------------------------------------------------------------

/// Why an individual died. Recorded exactly once; the first cause wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DeathCause {
    /// Age reached the species maximum.
    OldAge,
    /// Energy dropped to zero.
    Starvation,
    /// Eaten or hunted by another individual.
    Predation {
        /// Species of the individual that did the eating.
        predator: Species,
    },
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OldAge => write!(f, "old age"),
            Self::Starvation => write!(f, "starvation"),
            Self::Predation { predator } => {
                write!(f, "predation by {}", predator.trophic_role())
            }
        }
    }
}

//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every individual in the simulation carries a strongly-typed ID so that
//! snapshot consumers (renderers, dashboards) can track it across ticks.
//! IDs use UUID v7 (time-ordered).

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for an individual (grass patch, cow, or tiger).
///
/// Assigned at birth and never reused; offspring get a fresh ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Mint a time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The wrapped UUID.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

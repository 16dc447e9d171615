//! Planar coordinates and world bounds.
//!
//! The world is a closed rectangle `[0, width] x [0, height]`. Movement is
//! clamped to it; producer seeding requires landing strictly inside it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point in the 2D world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The rectangular extent of the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldBounds {
    /// Width of the world (x extends over `[0, width]`).
    pub width: f64,
    /// Height of the world (y extends over `[0, height]`).
    pub height: f64,
}

impl WorldBounds {
    /// Create bounds from world dimensions.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp a position onto the closed world rectangle.
    pub fn clamp(&self, position: Position) -> Position {
        Position {
            x: position.x.clamp(0.0, self.width),
            y: position.y.clamp(0.0, self.height),
        }
    }

    /// Whether a position lies strictly inside the world (not on an edge).
    pub fn contains_strictly(&self, position: Position) -> bool {
        position.x > 0.0 && position.x < self.width && position.y > 0.0 && position.y < self.height
    }
}

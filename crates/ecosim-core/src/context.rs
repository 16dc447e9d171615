//! Per-phase read context handed to every individual.
//!
//! A [`TickContext`] is rebuilt at the start of the update phase and again
//! at the start of the reproduction phase. It is immutable for the duration
//! of the phase and never outlives it. Mutation of other individuals goes
//! through [`Surroundings`](crate::population::Surroundings), never through
//! the context.

use std::f64::consts::PI;

use ecosim_types::{EntityId, Position, WorldBounds};

use crate::config::SpeciesTable;
use crate::population::PopulationRegistry;

/// Positions of the grass that was alive when the phase began.
///
/// `positions` and `ids` are parallel arrays. Deaths during the phase do
/// not update the field, so density reflects the start-of-phase layout.
#[derive(Debug, Clone, Default)]
pub struct ProducerField {
    positions: Vec<Position>,
    ids: Vec<EntityId>,
}

impl ProducerField {
    /// Capture alive grass from the registry.
    pub fn capture(registry: &PopulationRegistry) -> Self {
        let (positions, ids) = registry
            .grass()
            .iter()
            .filter(|grass| grass.is_alive())
            .map(|grass| (grass.position, grass.id()))
            .unzip();
        Self { positions, ids }
    }

    /// Count captured producers within `radius` of `center`, excluding `me`.
    pub fn neighbours_within(&self, me: EntityId, center: Position, radius: f64) -> usize {
        self.positions
            .iter()
            .zip(&self.ids)
            .filter(|(pos, id)| **id != me && pos.distance_to(&center) <= radius)
            .count()
    }

    /// Local producer density around `center`, in `[0, 1]`.
    ///
    /// The neighbour count is normalised by the number of patches that fit
    /// in the competition disc, `pi * radius^2 / footprint` (at least 1).
    #[allow(clippy::cast_precision_loss)]
    pub fn local_density(
        &self,
        me: EntityId,
        center: Position,
        radius: f64,
        footprint: f64,
    ) -> f64 {
        let neighbours = self.neighbours_within(me, center, radius);
        if neighbours == 0 {
            return 0.0;
        }
        let capacity = (PI * radius * radius / footprint).max(1.0);
        (neighbours as f64 / capacity).clamp(0.0, 1.0)
    }
}

/// Immutable context for one phase of a tick.
#[derive(Debug, Clone)]
pub struct TickContext<'a> {
    /// World rectangle.
    pub bounds: WorldBounds,
    /// Behaviour table for species-wide constants.
    pub species: &'a SpeciesTable,
    /// Start-of-phase grass layout for density queries.
    pub producers: ProducerField,
    /// The tick being processed.
    pub time_step: u64,
}

impl<'a> TickContext<'a> {
    /// Build a context from the current registry state.
    pub fn build(
        registry: &PopulationRegistry,
        bounds: WorldBounds,
        species: &'a SpeciesTable,
        time_step: u64,
    ) -> Self {
        Self {
            bounds,
            species,
            producers: ProducerField::capture(registry),
            time_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use ecosim_types::Species;

    fn registry_with_grass(table: &SpeciesTable, positions: &[(f64, f64)]) -> PopulationRegistry {
        let mut registry = PopulationRegistry::new();
        for &(x, y) in positions {
            registry.add(Entity::spawn(Species::Grass, Position::new(x, y), table));
        }
        registry
    }

    #[test]
    fn field_skips_dead_grass() {
        let table = SpeciesTable::default();
        let mut registry = registry_with_grass(&table, &[(10.0, 10.0), (20.0, 20.0)]);
        if let Some(first) = registry.list_mut(Species::Grass).first_mut() {
            first.die(ecosim_types::DeathCause::OldAge);
        }
        let field = ProducerField::capture(&registry);
        let stranger = EntityId::new();
        assert_eq!(
            field.neighbours_within(stranger, Position::new(15.0, 15.0), 100.0),
            1
        );
    }

    #[test]
    fn neighbours_exclude_self() {
        let table = SpeciesTable::default();
        let registry = registry_with_grass(&table, &[(10.0, 10.0), (12.0, 10.0), (500.0, 500.0)]);
        let field = ProducerField::capture(&registry);
        let me = registry.grass().first().map(Entity::id);
        let Some(me) = me else {
            return;
        };
        assert_eq!(field.neighbours_within(me, Position::new(10.0, 10.0), 30.0), 1);
    }

    #[test]
    fn lone_patch_has_zero_density() {
        let table = SpeciesTable::default();
        let registry = registry_with_grass(&table, &[(10.0, 10.0)]);
        let field = ProducerField::capture(&registry);
        let me = registry.grass().first().map(Entity::id);
        let Some(me) = me else {
            return;
        };
        let density = field.local_density(me, Position::new(10.0, 10.0), 30.0, 50.0);
        assert!(density.abs() < f64::EPSILON);
    }

    #[test]
    fn density_saturates_at_one() {
        let table = SpeciesTable::default();
        let crowd: Vec<(f64, f64)> = (0..20).map(|i| (10.0 + f64::from(i) * 0.1, 10.0)).collect();
        let registry = registry_with_grass(&table, &crowd);
        let field = ProducerField::capture(&registry);
        // A huge footprint makes the disc hold a single patch.
        let density = field.local_density(EntityId::new(), Position::new(10.0, 10.0), 5.0, 1.0e6);
        assert!((density - 1.0).abs() < f64::EPSILON);
    }
}

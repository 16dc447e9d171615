//! Producer behaviour: density-throttled growth.

use crate::config::GrassParams;
use crate::context::TickContext;

use super::{Entity, Traits};

/// Growth multiplier for a patch with no neighbours.
pub const UNCONTESTED_GROWTH_FACTOR: f64 = 2.0;

/// Growth never drops below this fraction of the base rate.
pub const GROWTH_FLOOR_FRACTION: f64 = 0.01;

/// Exponent applied to density before scaling by the competition effect.
const DENSITY_EXPONENT: f64 = 0.3;

/// Per-individual producer state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerTraits {
    /// Energy gained per tick before competition.
    pub base_growth_rate: f64,
    /// Probability that an otherwise eligible patch seeds.
    pub reproduction_chance: f64,
    /// Radius of the competition disc.
    pub competition_radius: f64,
    /// Growth penalty at full density.
    pub max_competition_effect: f64,
}

impl ProducerTraits {
    /// Copy the per-individual fields out of the behaviour table.
    pub const fn from_params(params: &GrassParams) -> Self {
        Self {
            base_growth_rate: params.base_growth_rate,
            reproduction_chance: params.reproduction_chance,
            competition_radius: params.competition_radius,
            max_competition_effect: params.max_competition_effect,
        }
    }

    /// Competition-adjusted growth for a given local density.
    ///
    /// Zero density doubles the base rate. Otherwise the rate is scaled by
    /// `1 - density^0.3 * max_competition_effect` and floored at 1% of base.
    pub fn growth_rate(&self, density: f64) -> f64 {
        let factor = if density <= 0.0 {
            UNCONTESTED_GROWTH_FACTOR
        } else {
            1.0 - density.powf(DENSITY_EXPONENT) * self.max_competition_effect
        };
        (self.base_growth_rate * factor).max(GROWTH_FLOOR_FRACTION * self.base_growth_rate)
    }
}

impl Entity {
    /// Producer body: grow according to start-of-phase neighbour density.
    pub(super) fn grow(&mut self, ctx: &TickContext<'_>) {
        let Traits::Producer(producer) = &self.traits else {
            return;
        };
        let density = ctx.producers.local_density(
            self.id,
            self.position,
            producer.competition_radius,
            ctx.species.grass.producer_footprint,
        );
        let growth = producer.growth_rate(density);
        self.gain_energy(growth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeciesTable;
    use crate::population::PopulationRegistry;
    use ecosim_types::{Position, Species, WorldBounds};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn traits() -> ProducerTraits {
        ProducerTraits::from_params(&GrassParams::default())
    }

    #[test]
    fn uncontested_growth_is_double_base() {
        let grass = traits();
        assert!((grass.growth_rate(0.0) - 2.0 * grass.base_growth_rate).abs() < EPS);
    }

    #[test]
    fn growth_never_drops_below_floor() {
        let mut grass = traits();
        grass.max_competition_effect = 5.0;
        for density in [0.01, 0.2, 0.5, 0.9, 1.0] {
            assert!(grass.growth_rate(density) >= 0.01 * grass.base_growth_rate - EPS);
        }
        assert!((grass.growth_rate(1.0) - 0.01 * grass.base_growth_rate).abs() < EPS);
    }

    #[test]
    fn growth_shrinks_with_density() {
        let grass = traits();
        let sparse = grass.growth_rate(0.1);
        let dense = grass.growth_rate(0.9);
        assert!(sparse > dense);
        assert!(sparse < grass.base_growth_rate);
        // Full density with the default effect: base * (1 - 0.8).
        assert!((grass.growth_rate(1.0) - 0.2 * grass.base_growth_rate).abs() < EPS);
    }

    #[test]
    fn lone_patch_grows_at_double_rate() {
        let table = SpeciesTable::default();
        let mut registry = PopulationRegistry::new();
        let mut patch = Entity::spawn(Species::Grass, Position::new(50.0, 50.0), &table);
        patch.set_energy(10.0);
        registry.add(patch.clone());

        let ctx = TickContext::build(&registry, WorldBounds::new(100.0, 100.0), &table, 0);
        let mut rng = StdRng::seed_from_u64(5);
        let mut empty = PopulationRegistry::new();
        let (_, mut surroundings) = empty.split_for(Species::Grass);
        patch.update(&ctx, &mut surroundings, &mut rng);

        assert!((patch.energy() - 14.0).abs() < EPS);
    }

    #[test]
    fn growth_clamps_at_max_energy() {
        let table = SpeciesTable::default();
        let registry = PopulationRegistry::new();
        let ctx = TickContext::build(&registry, WorldBounds::new(100.0, 100.0), &table, 0);
        let mut patch = Entity::spawn(Species::Grass, Position::new(50.0, 50.0), &table);
        patch.grow(&ctx);
        assert!((patch.energy() - patch.max_energy()).abs() < EPS);
    }

    #[test]
    fn seeding_off_the_map_costs_nothing() {
        let mut table = SpeciesTable::default();
        table.grass.reproduction_chance = 1.0;
        // Offsets this large from a corner leave the world most of the time.
        table.grass.life.offspring_offset = 1000.0;
        let registry = PopulationRegistry::new();
        let ctx = TickContext::build(&registry, WorldBounds::new(10.0, 10.0), &table, 0);
        let mut rng = StdRng::seed_from_u64(6);

        let mut misses = 0;
        for _ in 0..100 {
            let mut patch = Entity::spawn(Species::Grass, Position::new(0.0, 0.0), &table);
            let before = patch.energy();
            match patch.reproduce(&ctx, &mut rng) {
                None => {
                    misses += 1;
                    assert!((patch.energy() - before).abs() < EPS);
                    assert_eq!(patch.reproduction_cooldown(), 0);
                }
                Some(seedling) => {
                    assert!(ctx.bounds.contains_strictly(seedling.position));
                }
            }
        }
        assert!(misses > 0);
    }

    #[test]
    fn zero_chance_never_seeds() {
        let mut table = SpeciesTable::default();
        table.grass.reproduction_chance = 0.0;
        let registry = PopulationRegistry::new();
        let ctx = TickContext::build(&registry, WorldBounds::new(100.0, 100.0), &table, 0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut patch = Entity::spawn(Species::Grass, Position::new(50.0, 50.0), &table);
        for _ in 0..50 {
            assert!(patch.reproduce(&ctx, &mut rng).is_none());
        }
    }
}

//! Animal behaviour shared by herbivores and carnivores.
//!
//! Each tick an animal either rests (post-hunt cooldown) or moves: toward
//! the nearest living food it can detect, or one random step when nothing
//! is in range. It then burns its upkeep and tries to eat the first food
//! item within reach, scanning food lists in the order they are declared.

use std::f64::consts::TAU;

use ecosim_types::{DeathCause, Position, Species};
use rand::Rng;

use crate::config::AnimalParams;
use crate::context::TickContext;
use crate::population::Surroundings;

use super::{Entity, Traits};

/// Per-individual animal state.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalTraits {
    /// Distance covered per tick.
    pub movement_speed: f64,
    /// Maximum distance at which food is perceived.
    pub detection_range: f64,
    /// Maximum distance at which food can be eaten.
    pub hunting_range: f64,
    /// Current hunt success probability. Carnivores recompute it every tick.
    pub hunting_success_rate: f64,
    /// Energy burned every tick.
    pub energy_consumption: f64,
    /// Species this animal eats, scanned in order.
    pub food_types: Vec<Species>,
    /// Remaining ticks of post-hunt stillness.
    pub hunting_cooldown: u32,
    /// Stillness applied after a successful hunt.
    pub hunting_cooldown_duration: u32,
}

impl AnimalTraits {
    /// Copy the per-individual fields out of the behaviour table.
    pub fn from_params(params: &AnimalParams) -> Self {
        Self {
            movement_speed: params.movement_speed,
            detection_range: params.detection_range,
            hunting_range: params.hunting_range,
            hunting_success_rate: params.hunting_success_rate,
            energy_consumption: params.energy_consumption,
            food_types: params.food_types.clone(),
            hunting_cooldown: 0,
            hunting_cooldown_duration: params.hunting_cooldown_duration,
        }
    }
}

/// Success rate of a hunt given the hunter's condition.
///
/// Without a starving slope the baseline is returned unchanged. With one, a
/// hunter whose energy is at most a third of its reproduction cost takes
/// bigger risks the younger it is: `baseline + slope * (1 - age / max_age)`,
/// clamped to `[0, 1]`.
pub fn hunting_success_rate(params: &AnimalParams, energy: f64, age: u32, max_age: u32) -> f64 {
    let baseline = params.hunting_success_rate;
    let Some(slope) = params.starving_success_slope else {
        return baseline;
    };
    if energy > params.life.reproduction_energy_cost / 3.0 {
        return baseline;
    }
    let remaining = if max_age == 0 {
        0.0
    } else {
        1.0 - f64::from(age) / f64::from(max_age)
    };
    (baseline + slope * remaining).clamp(0.0, 1.0)
}

impl Entity {
    /// Animal body: adjust risk, move, burn upkeep, try to eat.
    pub(super) fn forage(
        &mut self,
        ctx: &TickContext<'_>,
        surroundings: &mut Surroundings<'_>,
        rng: &mut impl Rng,
    ) {
        let Some(params) = ctx.species.animal(self.species) else {
            return;
        };
        let rate = hunting_success_rate(params, self.energy, self.age, self.max_age);
        let Traits::Animal(animal) = &mut self.traits else {
            return;
        };
        animal.hunting_success_rate = rate;

        if animal.hunting_cooldown > 0 {
            animal.hunting_cooldown = animal.hunting_cooldown.saturating_sub(1);
        } else {
            let step = animal.movement_speed;
            let target = nearest_food(self.position, animal, surroundings);
            let next = match target {
                Some(target) => step_toward(self.position, target, step),
                None => random_step(self.position, step, rng),
            };
            self.position = ctx.bounds.clamp(next);
        }

        let upkeep = match &self.traits {
            Traits::Animal(animal) => animal.energy_consumption,
            Traits::Producer(_) => 0.0,
        };
        self.spend_energy(upkeep);
        self.eat(surroundings, rng);
    }

    /// Try to eat the first living food item within reach.
    ///
    /// Food lists are scanned in declaration order and each list in
    /// registration order. A failed hunt moves on to the next candidate;
    /// the first success ends the scan.
    fn eat(&mut self, surroundings: &mut Surroundings<'_>, rng: &mut impl Rng) {
        let Traits::Animal(animal) = &mut self.traits else {
            return;
        };
        let predator = self.species;
        for &food in &animal.food_types {
            for prey in surroundings.get_mut(food).iter_mut() {
                if !prey.is_alive()
                    || self.position.distance_to(&prey.position) > animal.hunting_range
                {
                    continue;
                }
                let caught = animal.hunting_success_rate >= 1.0
                    || rng.random::<f64>() < animal.hunting_success_rate;
                if !caught {
                    continue;
                }
                let meal = prey.energy;
                prey.die(DeathCause::Predation { predator });
                animal.hunting_cooldown = animal.hunting_cooldown_duration;
                self.energy = (self.energy + meal).min(self.max_energy);
                tracing::trace!(
                    predator = %predator,
                    prey = %prey.species,
                    meal,
                    "food consumed"
                );
                return;
            }
        }
    }
}

/// Nearest living food within detection range, across every food list.
fn nearest_food(
    from: Position,
    animal: &AnimalTraits,
    surroundings: &Surroundings<'_>,
) -> Option<Position> {
    animal
        .food_types
        .iter()
        .flat_map(|&food| surroundings.get(food))
        .filter(|candidate| candidate.is_alive())
        .map(|candidate| (candidate.position, from.distance_to(&candidate.position)))
        .filter(|&(_, distance)| distance <= animal.detection_range)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(position, _)| position)
}

/// One step of length `speed` toward `target`. Stays put when already there.
fn step_toward(from: Position, target: Position, speed: f64) -> Position {
    let distance = from.distance_to(&target);
    if distance <= 0.0 {
        return from;
    }
    Position::new(
        from.x + (target.x - from.x) / distance * speed,
        from.y + (target.y - from.y) / distance * speed,
    )
}

/// One step of length `speed` in a uniformly random direction.
fn random_step(from: Position, speed: f64, rng: &mut impl Rng) -> Position {
    let angle = rng.random_range(0.0..TAU);
    Position::new(from.x + angle.cos() * speed, from.y + angle.sin() * speed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SpeciesTable;
    use crate::population::PopulationRegistry;
    use ecosim_types::WorldBounds;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn bounds() -> WorldBounds {
        WorldBounds::new(100.0, 100.0)
    }

    #[test]
    fn well_fed_tiger_keeps_baseline_rate() {
        let params = AnimalParams::tiger();
        let rate = hunting_success_rate(&params, 100.0, 10, 120);
        assert!((rate - params.hunting_success_rate).abs() < EPS);
    }

    #[test]
    fn starving_tiger_takes_more_risk_when_young() {
        let params = AnimalParams::tiger();
        // Threshold is 60 / 3 = 20 energy.
        let newborn = hunting_success_rate(&params, 20.0, 0, 120);
        assert!((newborn - 0.8).abs() < EPS);
        let elderly = hunting_success_rate(&params, 5.0, 60, 120);
        assert!((elderly - 0.55).abs() < EPS);
    }

    #[test]
    fn cow_rate_ignores_hunger() {
        let params = AnimalParams::cow();
        assert!((hunting_success_rate(&params, 0.5, 10, 150) - 1.0).abs() < EPS);
    }

    #[test]
    fn step_toward_moves_exactly_speed() {
        let from = Position::new(0.0, 0.0);
        let next = step_toward(from, Position::new(30.0, 40.0), 5.0);
        assert!((next.x - 3.0).abs() < EPS);
        assert!((next.y - 4.0).abs() < EPS);
        assert_eq!(step_toward(from, from, 5.0), from);
    }

    #[test]
    fn random_step_has_fixed_length() {
        let mut rng = StdRng::seed_from_u64(8);
        let from = Position::new(50.0, 50.0);
        for _ in 0..20 {
            let next = random_step(from, 2.0, &mut rng);
            assert!((next.distance_to(&from) - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cow_walks_toward_nearest_grass() {
        let table = SpeciesTable::default();
        let mut registry = PopulationRegistry::new();
        registry.add(Entity::spawn(Species::Grass, Position::new(90.0, 50.0), &table));
        registry.add(Entity::spawn(Species::Grass, Position::new(60.0, 50.0), &table));
        let ctx = TickContext::build(&registry, bounds(), &table, 0);
        let mut rng = StdRng::seed_from_u64(9);

        let mut cow = Entity::spawn(Species::Cow, Position::new(50.0, 50.0), &table);
        let (_, mut surroundings) = registry.split_for(Species::Cow);
        cow.update(&ctx, &mut surroundings, &mut rng);

        assert!((cow.position.x - 52.0).abs() < EPS);
        assert!((cow.position.y - 50.0).abs() < EPS);
        assert!((cow.energy() - 99.0).abs() < EPS);
    }

    #[test]
    fn cow_ignores_dead_grass() {
        let table = SpeciesTable::default();
        let mut registry = PopulationRegistry::new();
        let mut dead = Entity::spawn(Species::Grass, Position::new(50.0, 50.0), &table);
        dead.die(DeathCause::OldAge);
        registry.add(dead);
        let ctx = TickContext::build(&registry, bounds(), &table, 0);
        let mut rng = StdRng::seed_from_u64(10);

        let mut cow = Entity::spawn(Species::Cow, Position::new(50.0, 50.0), &table);
        cow.set_energy(30.0);
        let (_, mut surroundings) = registry.split_for(Species::Cow);
        cow.update(&ctx, &mut surroundings, &mut rng);

        assert!((cow.energy() - 29.0).abs() < EPS);
        assert_eq!(registry.grass()[0].death_reason(), Some(DeathCause::OldAge));
    }

    #[test]
    fn only_first_grass_in_reach_is_eaten() {
        let table = SpeciesTable::default();
        let mut registry = PopulationRegistry::new();
        registry.add(Entity::spawn(Species::Grass, Position::new(50.0, 50.0), &table));
        registry.add(Entity::spawn(Species::Grass, Position::new(51.0, 50.0), &table));
        let ctx = TickContext::build(&registry, bounds(), &table, 0);
        let mut rng = StdRng::seed_from_u64(11);

        let mut cow = Entity::spawn(Species::Cow, Position::new(50.0, 50.0), &table);
        cow.set_energy(10.0);
        let (_, mut surroundings) = registry.split_for(Species::Cow);
        cow.update(&ctx, &mut surroundings, &mut rng);

        let grass = registry.grass();
        assert_eq!(
            grass[0].death_reason(),
            Some(DeathCause::Predation { predator: Species::Cow })
        );
        assert!(grass[1].is_alive());
        assert!((cow.energy() - 59.0).abs() < EPS);
    }

    #[test]
    fn successful_hunt_starts_cooldown_and_freezes_hunter() {
        let mut table = SpeciesTable::default();
        table.tiger.hunting_success_rate = 1.0;
        let mut registry = PopulationRegistry::new();
        registry.add(Entity::spawn(Species::Cow, Position::new(50.0, 50.0), &table));
        registry.add(Entity::spawn(Species::Cow, Position::new(80.0, 80.0), &table));
        let ctx = TickContext::build(&registry, bounds(), &table, 0);
        let mut rng = StdRng::seed_from_u64(12);

        let mut tiger = Entity::spawn(Species::Tiger, Position::new(50.0, 50.0), &table);
        tiger.set_energy(40.0);
        {
            let (_, mut surroundings) = registry.split_for(Species::Tiger);
            tiger.update(&ctx, &mut surroundings, &mut rng);
        }
        assert_eq!(
            registry.list(Species::Cow)[0].death_reason(),
            Some(DeathCause::Predation { predator: Species::Tiger })
        );
        // 40 - 2 upkeep + 100 meal.
        assert!((tiger.energy() - 138.0).abs() < EPS);
        assert_eq!(tiger.animal().unwrap().hunting_cooldown, 15);

        let resting_at = tiger.position;
        let (_, mut surroundings) = registry.split_for(Species::Tiger);
        tiger.update(&ctx, &mut surroundings, &mut rng);
        assert_eq!(tiger.position, resting_at);
        assert_eq!(tiger.animal().unwrap().hunting_cooldown, 14);
    }

    #[test]
    fn failed_hunt_leaves_prey_alive() {
        let mut table = SpeciesTable::default();
        table.tiger.hunting_success_rate = 0.0;
        table.tiger.starving_success_slope = None;
        let mut registry = PopulationRegistry::new();
        registry.add(Entity::spawn(Species::Cow, Position::new(50.0, 50.0), &table));
        let ctx = TickContext::build(&registry, bounds(), &table, 0);
        let mut rng = StdRng::seed_from_u64(13);

        let mut tiger = Entity::spawn(Species::Tiger, Position::new(50.0, 50.0), &table);
        let (_, mut surroundings) = registry.split_for(Species::Tiger);
        tiger.update(&ctx, &mut surroundings, &mut rng);

        assert!(registry.list(Species::Cow)[0].is_alive());
        assert_eq!(tiger.animal().unwrap().hunting_cooldown, 0);
    }

    #[test]
    fn animal_starves_when_energy_runs_out() {
        let table = SpeciesTable::default();
        let mut registry = PopulationRegistry::new();
        let ctx = TickContext::build(&registry, bounds(), &table, 0);
        let mut rng = StdRng::seed_from_u64(14);

        let mut tiger = Entity::spawn(Species::Tiger, Position::new(50.0, 50.0), &table);
        tiger.set_energy(2.0);
        let (_, mut surroundings) = registry.split_for(Species::Tiger);
        tiger.update(&ctx, &mut surroundings, &mut rng);

        assert_eq!(tiger.death_reason(), Some(DeathCause::Starvation));
        assert!(tiger.energy().abs() < EPS);
        assert!((0.0..=100.0).contains(&tiger.position.x));
    }
}

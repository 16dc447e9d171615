//! The individual: a tagged variant with a shared lifecycle contract.
//!
//! Every individual carries the same base state (position, energy, age,
//! reproduction cooldown, death record). What differs per kind lives in
//! [`Traits`]: producers grow in place ([`producer`]), animals move and
//! forage ([`animal`]). Species-wide constants that never vary between
//! individuals are read from the [`SpeciesTable`] carried by the
//! [`TickContext`].
//!
//! # Lifecycle
//!
//! `Alive -> Dead(cause)`, terminal. An individual is alive exactly when it
//! has no recorded [`DeathCause`], so "dead implies a cause" holds by
//! construction, and [`Entity::die`] keeps the first cause it is given.

pub mod animal;
pub mod producer;

use ecosim_types::{DeathCause, EntityId, IndividualSnapshot, Position, Species};
use rand::Rng;

use crate::config::SpeciesTable;
use crate::context::TickContext;
use crate::population::Surroundings;

pub use animal::AnimalTraits;
pub use producer::ProducerTraits;

/// Kind-specific state.
#[derive(Debug, Clone, PartialEq)]
pub enum Traits {
    /// Grass.
    Producer(ProducerTraits),
    /// Cows and tigers.
    Animal(AnimalTraits),
}

/// One individual of any species.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    species: Species,
    /// Current location, always within world bounds.
    pub position: Position,
    energy: f64,
    max_energy: f64,
    age: u32,
    max_age: u32,
    death: Option<DeathCause>,
    reproduction_cooldown: u32,
    reproduction_energy_cost: f64,
    traits: Traits,
}

impl Entity {
    /// Create a newborn of `species` at `position` with full energy.
    pub fn spawn(species: Species, position: Position, table: &SpeciesTable) -> Self {
        let life = table.life(species);
        let traits = match table.animal(species) {
            Some(params) => Traits::Animal(AnimalTraits::from_params(params)),
            None => Traits::Producer(ProducerTraits::from_params(&table.grass)),
        };
        Self {
            id: EntityId::new(),
            species,
            position,
            energy: life.energy,
            max_energy: life.energy,
            age: 0,
            max_age: life.max_age,
            death: None,
            reproduction_cooldown: 0,
            reproduction_energy_cost: life.reproduction_energy_cost,
            traits,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Stable identifier.
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Species tag.
    pub const fn species(&self) -> Species {
        self.species
    }

    /// Current energy.
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    /// Energy ceiling.
    pub const fn max_energy(&self) -> f64 {
        self.max_energy
    }

    /// Age in ticks.
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Age at which the individual dies of old age.
    pub const fn max_age(&self) -> u32 {
        self.max_age
    }

    /// Whether the individual is alive.
    pub const fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    /// Why the individual died, if it did.
    pub const fn death_reason(&self) -> Option<DeathCause> {
        self.death
    }

    /// Ticks until the individual may reproduce again.
    pub const fn reproduction_cooldown(&self) -> u32 {
        self.reproduction_cooldown
    }

    /// Energy deducted per reproduction.
    pub const fn reproduction_energy_cost(&self) -> f64 {
        self.reproduction_energy_cost
    }

    /// Animal state, or `None` for grass.
    pub const fn animal(&self) -> Option<&AnimalTraits> {
        match &self.traits {
            Traits::Animal(animal) => Some(animal),
            Traits::Producer(_) => None,
        }
    }

    /// Producer state, or `None` for animals.
    pub const fn producer(&self) -> Option<&ProducerTraits> {
        match &self.traits {
            Traits::Producer(producer) => Some(producer),
            Traits::Animal(_) => None,
        }
    }

    // -----------------------------------------------------------------------
    // Setters used by scenario setup
    // -----------------------------------------------------------------------

    /// Set energy, clamped to `[0, max_energy]`.
    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy.clamp(0.0, self.max_energy);
    }

    /// Set the age.
    pub const fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    /// Set the reproduction cooldown.
    pub const fn set_reproduction_cooldown(&mut self, ticks: u32) {
        self.reproduction_cooldown = ticks;
    }

    /// Builder form of [`set_energy`](Self::set_energy).
    #[must_use]
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.set_energy(energy);
        self
    }

    /// Builder form of [`set_reproduction_cooldown`](Self::set_reproduction_cooldown).
    #[must_use]
    pub const fn with_reproduction_cooldown(mut self, ticks: u32) -> Self {
        self.reproduction_cooldown = ticks;
        self
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Record death. Returns `true` if this call killed the individual;
    /// a dead individual keeps its original cause.
    pub const fn die(&mut self, cause: DeathCause) -> bool {
        if self.death.is_some() {
            return false;
        }
        self.death = Some(cause);
        true
    }

    /// Add energy, never exceeding the ceiling.
    pub fn gain_energy(&mut self, amount: f64) {
        self.energy = (self.energy + amount).min(self.max_energy);
    }

    /// Burn energy, never dropping below zero.
    pub fn spend_energy(&mut self, amount: f64) {
        self.energy = (self.energy - amount).max(0.0);
    }

    /// Grow one tick older, dying of old age at `max_age`.
    pub fn age_one_step(&mut self) {
        self.age = self.age.saturating_add(1);
        if self.age >= self.max_age {
            self.die(DeathCause::OldAge);
        }
    }

    /// Advance one tick.
    ///
    /// Dead individuals are untouched. Otherwise the reproduction cooldown
    /// ticks down, the kind-specific body runs, and the individual ages.
    /// Animals that end the tick without energy starve.
    pub fn update(
        &mut self,
        ctx: &TickContext<'_>,
        surroundings: &mut Surroundings<'_>,
        rng: &mut impl Rng,
    ) {
        if !self.is_alive() {
            return;
        }
        self.reproduction_cooldown = self.reproduction_cooldown.saturating_sub(1);

        match self.traits {
            Traits::Producer(_) => self.grow(ctx),
            Traits::Animal(_) => self.forage(ctx, surroundings, rng),
        }

        self.age_one_step();

        if self.species.is_animal() && self.energy <= 0.0 {
            self.die(DeathCause::Starvation);
        }
    }

    /// Whether the individual is eligible to reproduce this tick.
    ///
    /// Requires life, twice the reproduction cost in reserve, an expired
    /// cooldown, and for animals an age above the species minimum.
    ///
    /// For grass this is necessary but not sufficient: the seeding chance
    /// and the on-map check are random and belong to the attempt itself,
    /// so they are applied in [`Entity::reproduce`]. An eligible patch may
    /// still produce nothing, at no cost.
    pub fn can_reproduce(&self, table: &SpeciesTable) -> bool {
        if !self.is_alive()
            || self.energy < 2.0 * self.reproduction_energy_cost
            || self.reproduction_cooldown > 0
        {
            return false;
        }
        match table.animal(self.species) {
            Some(params) => self.age > params.min_reproductive_age,
            None => true,
        }
    }

    /// Produce one offspring near the parent, or `None` when ineligible.
    ///
    /// On success the parent pays `reproduction_energy_cost` and its
    /// cooldown resets to the species constant.
    pub fn reproduce(&mut self, ctx: &TickContext<'_>, rng: &mut impl Rng) -> Option<Self> {
        if !self.can_reproduce(ctx.species) {
            return None;
        }
        let life = ctx.species.life(self.species);
        let offset = life.offspring_offset;
        let raw = Position::new(
            self.position.x + rng.random_range(-offset..=offset),
            self.position.y + rng.random_range(-offset..=offset),
        );

        let birthplace = match &self.traits {
            Traits::Producer(producer) => {
                if rng.random::<f64>() >= producer.reproduction_chance {
                    return None;
                }
                // Seeds landing on or beyond the edge are lost.
                if !ctx.bounds.contains_strictly(raw) {
                    return None;
                }
                raw
            }
            Traits::Animal(_) => ctx.bounds.clamp(raw),
        };

        self.energy -= self.reproduction_energy_cost;
        self.reproduction_cooldown = life.reproduction_cooldown;
        Some(Self::spawn(self.species, birthplace, ctx.species))
    }

    /// Render-facing copy of this individual.
    pub const fn snapshot(&self) -> IndividualSnapshot {
        IndividualSnapshot {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            energy: self.energy,
            age: self.age,
            max_energy: self.max_energy,
        }
    }
}

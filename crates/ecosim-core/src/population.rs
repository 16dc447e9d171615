//! Per-species ordered containers of individuals.
//!
//! The registry owns every individual. During a phase, the individual being
//! processed is borrowed out of its own species list while the other two
//! lists are handed to it as [`Surroundings`], so a hunter can mark prey
//! dead without any shared mutable state.

use ecosim_types::{PopulationCounts, Species};

use crate::entity::Entity;

/// Individuals bucketed by species, each bucket in registration order.
#[derive(Debug, Clone, Default)]
pub struct PopulationRegistry {
    grass: Vec<Entity>,
    cow: Vec<Entity>,
    tiger: Vec<Entity>,
}

impl PopulationRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            grass: Vec::new(),
            cow: Vec::new(),
            tiger: Vec::new(),
        }
    }

    /// Register one individual in its species bucket.
    pub fn add(&mut self, entity: Entity) {
        self.list_mut(entity.species()).push(entity);
    }

    /// Register many individuals, each in its own species bucket.
    pub fn extend(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            self.add(entity);
        }
    }

    /// Remove dead individuals of one species, returning how many went.
    pub fn filter_alive(&mut self, species: Species) -> usize {
        let list = self.list_mut(species);
        let before = list.len();
        list.retain(Entity::is_alive);
        before.saturating_sub(list.len())
    }

    /// Registered individuals of one species, dead or alive.
    pub fn count(&self, species: Species) -> usize {
        self.list(species).len()
    }

    /// Registered individuals across all species.
    pub fn total_count(&self) -> usize {
        self.grass
            .len()
            .saturating_add(self.cow.len())
            .saturating_add(self.tiger.len())
    }

    /// Per-species counts as stored in the population history.
    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts::new(
            self.grass.len() as u64,
            self.cow.len() as u64,
            self.tiger.len() as u64,
        )
    }

    /// Drop every individual of one species.
    pub fn clear(&mut self, species: Species) {
        self.list_mut(species).clear();
    }

    /// Drop every individual.
    pub fn clear_all(&mut self) {
        for species in Species::ALL {
            self.clear(species);
        }
    }

    /// The ordered list for one species.
    pub fn list(&self, species: Species) -> &[Entity] {
        match species {
            Species::Grass => &self.grass,
            Species::Cow => &self.cow,
            Species::Tiger => &self.tiger,
        }
    }

    /// Mutable access to the list for one species.
    pub const fn list_mut(&mut self, species: Species) -> &mut Vec<Entity> {
        match species {
            Species::Grass => &mut self.grass,
            Species::Cow => &mut self.cow,
            Species::Tiger => &mut self.tiger,
        }
    }

    /// Shorthand for the producer list.
    pub fn grass(&self) -> &[Entity] {
        &self.grass
    }

    /// Borrow one species list mutably alongside the other two.
    pub fn split_for(&mut self, species: Species) -> (&mut Vec<Entity>, Surroundings<'_>) {
        match species {
            Species::Grass => (
                &mut self.grass,
                Surroundings {
                    actor: species,
                    grass: &mut [],
                    cow: &mut self.cow,
                    tiger: &mut self.tiger,
                },
            ),
            Species::Cow => (
                &mut self.cow,
                Surroundings {
                    actor: species,
                    grass: &mut self.grass,
                    cow: &mut [],
                    tiger: &mut self.tiger,
                },
            ),
            Species::Tiger => (
                &mut self.tiger,
                Surroundings {
                    actor: species,
                    grass: &mut self.grass,
                    cow: &mut self.cow,
                    tiger: &mut [],
                },
            ),
        }
    }
}

/// The species lists other than the acting one.
///
/// The acting species' own slot is always empty: an individual cannot see
/// or touch members of its own species through its surroundings.
#[derive(Debug)]
pub struct Surroundings<'a> {
    actor: Species,
    grass: &'a mut [Entity],
    cow: &'a mut [Entity],
    tiger: &'a mut [Entity],
}

impl Surroundings<'_> {
    /// The species whose list was lent out.
    pub const fn actor(&self) -> Species {
        self.actor
    }

    /// Read another species' list (empty for the acting species).
    pub fn get(&self, species: Species) -> &[Entity] {
        match species {
            Species::Grass => &*self.grass,
            Species::Cow => &*self.cow,
            Species::Tiger => &*self.tiger,
        }
    }

    /// Mutate another species' list (empty for the acting species).
    pub fn get_mut(&mut self, species: Species) -> &mut [Entity] {
        match species {
            Species::Grass => &mut *self.grass,
            Species::Cow => &mut *self.cow,
            Species::Tiger => &mut *self.tiger,
        }
    }
}

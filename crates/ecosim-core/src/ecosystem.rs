//! The ecosystem orchestrator: owns the population and runs ticks.

use std::collections::{BTreeMap, VecDeque};

use ecosim_types::{
    EcosystemSnapshot, EntityId, PopulationCounts, Position, Species, SpeciesStatistics, SpeciesTally,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::entity::Entity;
use crate::population::PopulationRegistry;
use crate::tick::{self, TickSummary};

/// Number of per-tick population records retained.
pub const HISTORY_CAPACITY: usize = 100;

/// Ticks between census log lines.
const CENSUS_INTERVAL: u64 = 100;

/// A closed three-tier ecosystem.
///
/// Holds the configuration, the population registry, the step counter,
/// cumulative birth and death tallies, a bounded population history, and
/// the engine's random generator.
#[derive(Debug)]
pub struct Ecosystem {
    config: SimulationConfig,
    population: PopulationRegistry,
    time_step: u64,
    births: SpeciesTally,
    deaths: SpeciesTally,
    history: VecDeque<PopulationCounts>,
    rng: StdRng,
}

impl Ecosystem {
    /// Build an ecosystem seeded with the configured initial populations.
    ///
    /// The generator is seeded from `config.seed` when set, otherwise from
    /// the operating system.
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut ecosystem = Self::empty(config, rng);
        ecosystem.populate();
        ecosystem
    }

    /// Build an ecosystem with no individuals, for hand-placed scenarios.
    pub fn empty(config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            config,
            population: PopulationRegistry::new(),
            time_step: 0,
            births: SpeciesTally::default(),
            deaths: SpeciesTally::default(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The active configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Completed ticks since the last reset.
    pub const fn time_step(&self) -> u64 {
        self.time_step
    }

    /// Cumulative births since the last reset.
    pub const fn births(&self) -> SpeciesTally {
        self.births
    }

    /// Cumulative deaths since the last reset.
    pub const fn deaths(&self) -> SpeciesTally {
        self.deaths
    }

    /// Population counts after each retained tick, oldest first.
    pub const fn history(&self) -> &VecDeque<PopulationCounts> {
        &self.history
    }

    /// The population registry.
    pub const fn population(&self) -> &PopulationRegistry {
        &self.population
    }

    /// Mutable access to the registry, for placing individuals by hand.
    pub const fn population_mut(&mut self) -> &mut PopulationRegistry {
        &mut self.population
    }

    /// A newborn of `species` at `position` under the active behaviour
    /// table. Not registered until passed to [`insert`](Self::insert).
    pub fn new_entity(&self, species: Species, position: Position) -> Entity {
        Entity::spawn(species, position, &self.config.species)
    }

    /// Register an individual and return its id.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.population.add(entity);
        id
    }

    /// Register a newborn of `species` at `position` and return its id.
    pub fn spawn(&mut self, species: Species, position: Position) -> EntityId {
        self.insert(self.new_entity(species, position))
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the ecosystem by one tick.
    ///
    /// Runs update, reproduction and cleanup, records the resulting counts
    /// in the bounded history, folds births and deaths into the running
    /// tallies, and increments the step counter.
    pub fn step(&mut self) -> TickSummary {
        let summary = tick::run_tick(
            &mut self.population,
            self.config.ecosystem.bounds(),
            &self.config.species,
            self.time_step,
            &mut self.rng,
        );

        for species in Species::ALL {
            self.births.add(species, summary.births.get(species));
            self.deaths.add(species, summary.deaths.get(species));
        }

        // --- Statistics ---
        self.history.push_back(summary.counts);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }

        self.time_step = self.time_step.saturating_add(1);

        if self.time_step.checked_rem(CENSUS_INTERVAL) == Some(0) {
            info!(
                time_step = self.time_step,
                grass = summary.counts.grass,
                cow = summary.counts.cow,
                tiger = summary.counts.tiger,
                births = self.births.total(),
                deaths = self.deaths.total(),
                "Census"
            );
        }

        summary
    }

    /// Species with no registered individuals, in processing order.
    pub fn check_extinction(&self) -> Vec<Species> {
        Species::ALL
            .into_iter()
            .filter(|&species| self.population.count(species) == 0)
            .collect()
    }

    /// Reinitialise the ecosystem, optionally under a new configuration.
    ///
    /// Zeroes the step counter and tallies, clears the history and the
    /// registry, then seeds the configured initial populations at uniform
    /// random positions. The random generator is kept unless the new
    /// configuration carries a seed.
    pub fn reset(&mut self, config: Option<SimulationConfig>) {
        if let Some(config) = config {
            if let Some(seed) = config.seed {
                self.rng = StdRng::seed_from_u64(seed);
            }
            self.config = config;
        }
        self.time_step = 0;
        self.births = SpeciesTally::default();
        self.deaths = SpeciesTally::default();
        self.history.clear();
        self.population.clear_all();
        self.populate();
    }

    fn populate(&mut self) {
        let eco = &self.config.ecosystem;
        for species in Species::ALL {
            for _ in 0..eco.initial_count(species) {
                let position = Position::new(
                    self.rng.random_range(0.0..=eco.world_width),
                    self.rng.random_range(0.0..=eco.world_height),
                );
                self.population
                    .add(Entity::spawn(species, position, &self.config.species));
            }
        }
        debug!(
            grass = self.population.count(Species::Grass),
            cow = self.population.count(Species::Cow),
            tiger = self.population.count(Species::Tiger),
            "Ecosystem populated"
        );
    }

    // -----------------------------------------------------------------------
    // Read models
    // -----------------------------------------------------------------------

    /// Deep copy of the committed state.
    pub fn snapshot(&self) -> EcosystemSnapshot {
        let individuals = Species::ALL
            .into_iter()
            .map(|species| {
                let living = self
                    .population
                    .list(species)
                    .iter()
                    .filter(|e| e.is_alive())
                    .map(Entity::snapshot)
                    .collect();
                (species, living)
            })
            .collect::<BTreeMap<_, _>>();

        EcosystemSnapshot {
            individuals,
            counts: self.population.counts(),
            time_step: self.time_step,
            births: self.births,
            deaths: self.deaths,
            population_history: self.history.iter().copied().collect(),
        }
    }

    /// Alive count, mean energy and mean age for every species.
    #[allow(clippy::cast_precision_loss)]
    pub fn statistics(&self) -> BTreeMap<Species, SpeciesStatistics> {
        Species::ALL
            .into_iter()
            .map(|species| {
                let (alive, energy, age) = self
                    .population
                    .list(species)
                    .iter()
                    .filter(|e| e.is_alive())
                    .fold((0_u64, 0.0, 0.0), |(n, energy, age), e| {
                        (n.saturating_add(1), energy + e.energy(), age + f64::from(e.age()))
                    });
                let stats = if alive == 0 {
                    SpeciesStatistics::default()
                } else {
                    SpeciesStatistics {
                        alive,
                        mean_energy: energy / alive as f64,
                        mean_age: age / alive as f64,
                    }
                };
                (species, stats)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(grass: u32, cows: u32, tigers: u32) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.ecosystem.initial_grass = grass;
        config.ecosystem.initial_cows = cows;
        config.ecosystem.initial_tigers = tigers;
        config.seed = Some(42);
        config
    }

    #[test]
    fn new_seeds_initial_populations_within_bounds() {
        let eco = Ecosystem::new(config(100, 10, 1));
        assert_eq!(eco.population().counts(), PopulationCounts::new(100, 10, 1));
        let bounds = eco.config().ecosystem.bounds();
        for species in Species::ALL {
            for e in eco.population().list(species) {
                assert!((0.0..=bounds.width).contains(&e.position.x));
                assert!((0.0..=bounds.height).contains(&e.position.y));
                assert_eq!(e.age(), 0);
            }
        }
        assert_eq!(eco.time_step(), 0);
        assert!(eco.history().is_empty());
    }

    #[test]
    fn step_advances_counter_and_records_history() {
        let mut eco = Ecosystem::new(config(20, 2, 0));
        let summary = eco.step();
        assert_eq!(summary.tick, 0);
        assert_eq!(eco.time_step(), 1);
        assert_eq!(eco.history().len(), 1);
        assert_eq!(eco.history()[0], eco.population().counts());
    }

    #[test]
    fn history_is_capped() {
        let mut eco = Ecosystem::new(config(0, 0, 0));
        for _ in 0..(HISTORY_CAPACITY + 25) {
            eco.step();
        }
        assert_eq!(eco.history().len(), HISTORY_CAPACITY);
        assert_eq!(eco.time_step(), (HISTORY_CAPACITY + 25) as u64);
    }

    #[test]
    fn tallies_accumulate_across_ticks() {
        let mut eco = Ecosystem::new(config(50, 5, 1));
        let mut births = 0;
        let mut deaths = 0;
        for _ in 0..30 {
            let summary = eco.step();
            births += summary.births.total();
            deaths += summary.deaths.total();
        }
        assert_eq!(eco.births().total(), births);
        assert_eq!(eco.deaths().total(), deaths);
        assert_eq!(
            eco.population().total_count() as u64,
            56 + births - deaths
        );
    }

    #[test]
    fn extinction_reports_empty_species() {
        let eco = Ecosystem::new(config(10, 3, 0));
        assert_eq!(eco.check_extinction(), vec![Species::Tiger]);
        let barren = Ecosystem::new(config(0, 0, 0));
        assert_eq!(barren.check_extinction(), Species::ALL.to_vec());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut eco = Ecosystem::new(config(30, 4, 1));
        for _ in 0..10 {
            eco.step();
        }
        eco.reset(Some(config(5, 2, 0)));
        assert_eq!(eco.time_step(), 0);
        assert!(eco.history().is_empty());
        assert_eq!(eco.births(), SpeciesTally::default());
        assert_eq!(eco.deaths(), SpeciesTally::default());
        assert_eq!(eco.population().counts(), PopulationCounts::new(5, 2, 0));

        eco.reset(None);
        assert_eq!(eco.population().counts(), PopulationCounts::new(5, 2, 0));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = Ecosystem::new(config(40, 5, 1));
        let mut b = Ecosystem::new(config(40, 5, 1));
        for _ in 0..25 {
            assert_eq!(a.step(), b.step());
        }
    }

    #[test]
    fn snapshot_lists_living_individuals() {
        let mut eco = Ecosystem::empty(config(0, 0, 0), StdRng::seed_from_u64(1));
        eco.insert(eco.new_entity(Species::Cow, Position::new(5.0, 5.0)).with_energy(42.0));
        eco.spawn(Species::Grass, Position::new(1.0, 1.0));
        let snap = eco.snapshot();
        assert_eq!(snap.counts, PopulationCounts::new(1, 1, 0));
        assert_eq!(snap.individuals[&Species::Cow].len(), 1);
        assert!((snap.individuals[&Species::Cow][0].energy - 42.0).abs() < 1e-9);
        assert!(snap.individuals[&Species::Tiger].is_empty());
        assert_eq!(snap.time_step, 0);
    }

    #[test]
    fn statistics_average_living_individuals() {
        let mut eco = Ecosystem::empty(config(0, 0, 0), StdRng::seed_from_u64(1));
        eco.insert(eco.new_entity(Species::Cow, Position::new(5.0, 5.0)).with_energy(40.0));
        eco.insert(eco.new_entity(Species::Cow, Position::new(6.0, 5.0)).with_energy(60.0));
        let stats = eco.statistics();
        assert_eq!(stats[&Species::Cow].alive, 2);
        assert!((stats[&Species::Cow].mean_energy - 50.0).abs() < 1e-9);
        assert_eq!(stats[&Species::Tiger], SpeciesStatistics::default());
    }
}

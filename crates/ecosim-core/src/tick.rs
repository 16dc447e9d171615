//! Tick cycle: the phases that advance the ecosystem by one step.
//!
//! Each tick runs these phases in order:
//!
//! 1. **Update** -- every registered individual acts: producers grow,
//!    animals move and forage, everyone ages. Species go in the order
//!    grass, cow, tiger, and within a species in registration order. The
//!    first consumer to reach a food item wins it; later consumers see it
//!    dead. Dead individuals stay registered until cleanup.
//!
//! 2. **Reproduction** -- against a fresh context, every eligible living
//!    individual may produce one offspring. Offspring are registered only
//!    after all species are processed, so newborns never act in the tick
//!    they are born.
//!
//! 3. **Cleanup** -- dead individuals are tallied and removed.
//!
//! Statistics and the step counter are handled by the
//! [`Ecosystem`](crate::ecosystem::Ecosystem) that owns the registry.
//! Ticking cannot fail.

use ecosim_types::{PopulationCounts, Species, SpeciesTally, WorldBounds};
use rand::Rng;
use tracing::debug;

use crate::config::SpeciesTable;
use crate::context::TickContext;
use crate::entity::Entity;
use crate::population::PopulationRegistry;

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed (0-based).
    pub tick: u64,
    /// Offspring registered during this tick.
    pub births: SpeciesTally,
    /// Individuals removed during this tick's cleanup.
    pub deaths: SpeciesTally,
    /// Registered individuals after cleanup.
    pub counts: PopulationCounts,
}

/// Run the update, reproduction and cleanup phases on `registry`.
pub fn run_tick(
    registry: &mut PopulationRegistry,
    bounds: WorldBounds,
    species: &SpeciesTable,
    tick: u64,
    rng: &mut impl Rng,
) -> TickSummary {
    // --- Phase 1: Update ---
    let ctx = TickContext::build(registry, bounds, species, tick);
    phase_update(registry, &ctx, rng);

    // --- Phase 2: Reproduction ---
    let ctx = TickContext::build(registry, bounds, species, tick);
    let births = phase_reproduction(registry, &ctx, rng);

    // --- Phase 3: Cleanup ---
    let deaths = phase_cleanup(registry, tick);

    let counts = registry.counts();
    debug!(
        tick,
        grass = counts.grass,
        cow = counts.cow,
        tiger = counts.tiger,
        births = births.total(),
        deaths = deaths.total(),
        "Tick completed"
    );

    TickSummary {
        tick,
        births,
        deaths,
        counts,
    }
}

/// Phase 1: Update.
///
/// Each species list is lent out in turn while the other two are exposed as
/// surroundings. Nothing is appended during this phase, so walking the list
/// in place visits exactly the individuals registered when it began.
fn phase_update(registry: &mut PopulationRegistry, ctx: &TickContext<'_>, rng: &mut impl Rng) {
    for species in Species::ALL {
        let (own, mut surroundings) = registry.split_for(species);
        for entity in own.iter_mut() {
            entity.update(ctx, &mut surroundings, rng);
        }
    }
}

/// Phase 2: Reproduction.
///
/// Returns per-species birth counts. Offspring are held back and registered
/// together once every species has had its turn.
fn phase_reproduction(
    registry: &mut PopulationRegistry,
    ctx: &TickContext<'_>,
    rng: &mut impl Rng,
) -> SpeciesTally {
    let mut offspring: Vec<Entity> = Vec::new();
    let mut births = SpeciesTally::default();

    for species in Species::ALL {
        for parent in registry.list_mut(species).iter_mut() {
            if let Some(child) = parent.reproduce(ctx, rng) {
                births.add(species, 1);
                if species.is_animal() {
                    debug!(
                        tick = ctx.time_step,
                        %species,
                        parent = %parent.id(),
                        child = %child.id(),
                        "Birth"
                    );
                }
                offspring.push(child);
            }
        }
    }

    registry.extend(offspring);
    births
}

/// Phase 3: Cleanup.
///
/// Tallies and removes every dead individual.
fn phase_cleanup(registry: &mut PopulationRegistry, tick: u64) -> SpeciesTally {
    let mut deaths = SpeciesTally::default();

    for species in Species::ALL {
        if species.is_animal() {
            for dead in registry.list(species).iter().filter(|e| !e.is_alive()) {
                if let Some(cause) = dead.death_reason() {
                    debug!(
                        tick,
                        %species,
                        id = %dead.id(),
                        age = dead.age(),
                        %cause,
                        "Animal died"
                    );
                }
            }
        }
        let removed = registry.filter_alive(species);
        deaths.add(species, removed as u64);
    }

    deaths
}

//! Configuration loading and typed config structures for the simulation.
//!
//! Configuration is read from a YAML file (conventionally
//! `ecosim-config.yaml`). Every section is optional and falls back to the
//! defaults below, which reproduce the reference ecosystem: an 800x600
//! world seeded with 100 grass, 10 cows and 1 tiger, ticking at 30 Hz.
//!
//! The [`SpeciesTable`] is the per-kind behaviour table: energy budgets,
//! lifespans, reproduction constants, growth and hunting parameters. A
//! species section, when present in YAML, must be complete.

use std::path::Path;

use ecosim_types::{Species, WorldBounds};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides [`SimulationConfig::seed`].
pub const SEED_ENV_VAR: &str = "ECOSIM_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible world.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World size and initial populations.
    #[serde(default)]
    pub ecosystem: EcosystemConfig,

    /// Stepping cadence of the background clock.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Seed for the engine PRNG. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Per-species behaviour table.
    #[serde(default)]
    pub species: SpeciesTable,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Run boundaries for the headless engine.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `ECOSIM_SEED`, when set to a valid `u64`, overrides the seed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override the seed from `ECOSIM_SEED` when it is set and parses.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            self.seed = Some(seed);
        }
    }

    /// Check that the configuration describes a runnable world.
    ///
    /// The engine itself trusts its configuration; this is for loaders.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ecosystem.world_width", self.ecosystem.world_width)?;
        positive("ecosystem.world_height", self.ecosystem.world_height)?;
        positive("clock.target_rate", self.clock.target_rate)?;
        self.species.validate()
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// `value` must be finite and strictly positive.
fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be positive, got {value}")))
    }
}

/// `value` must be finite and not negative.
fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be non-negative, got {value}")))
    }
}

/// `value` must lie in `[0, 1]`.
fn probability(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be within [0, 1], got {value}")))
    }
}

/// World size and initial populations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcosystemConfig {
    /// World width.
    #[serde(default = "default_world_width")]
    pub world_width: f64,

    /// World height.
    #[serde(default = "default_world_height")]
    pub world_height: f64,

    /// Grass patches seeded at reset.
    #[serde(default = "default_initial_grass")]
    pub initial_grass: u32,

    /// Cows seeded at reset.
    #[serde(default = "default_initial_cows")]
    pub initial_cows: u32,

    /// Tigers seeded at reset.
    #[serde(default = "default_initial_tigers")]
    pub initial_tigers: u32,
}

impl EcosystemConfig {
    /// The world rectangle.
    pub const fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.world_width, self.world_height)
    }

    /// Initial population for one species.
    pub const fn initial_count(&self, species: Species) -> u32 {
        match species {
            Species::Grass => self.initial_grass,
            Species::Cow => self.initial_cows,
            Species::Tiger => self.initial_tigers,
        }
    }
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            world_width: default_world_width(),
            world_height: default_world_height(),
            initial_grass: default_initial_grass(),
            initial_cows: default_initial_cows(),
            initial_tigers: default_initial_tigers(),
        }
    }
}

/// Stepping cadence of the background clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Ticks per second at speed 1.0.
    #[serde(default = "default_target_rate")]
    pub target_rate: f64,

    /// Speed multiplier applied at construction (clamped to `[0.1, 5.0]`).
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            target_rate: default_target_rate(),
            initial_speed: default_initial_speed(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Run boundaries for the headless engine binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop after this many wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

// ---------------------------------------------------------------------------
// Behaviour table
// ---------------------------------------------------------------------------

/// Parameters shared by every species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeParams {
    /// Starting energy, which is also the energy ceiling.
    pub energy: f64,
    /// Age at which the individual dies of old age.
    pub max_age: u32,
    /// Energy deducted per successful reproduction. Reproduction needs
    /// twice this amount in reserve.
    pub reproduction_energy_cost: f64,
    /// Ticks before the parent may reproduce again.
    pub reproduction_cooldown: u32,
    /// Maximum per-axis distance between parent and offspring.
    pub offspring_offset: f64,
}

/// Producer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrassParams {
    /// Shared life parameters.
    #[serde(flatten)]
    pub life: LifeParams,
    /// Energy gained per tick before competition.
    pub base_growth_rate: f64,
    /// Probability that an otherwise eligible patch seeds this tick.
    pub reproduction_chance: f64,
    /// Radius within which neighbouring grass competes for growth.
    pub competition_radius: f64,
    /// Growth penalty at full density (0 = none, 1 = total).
    pub max_competition_effect: f64,
    /// Area one patch occupies; the competition disc holds at most
    /// `pi * r^2 / footprint` neighbours.
    pub producer_footprint: f64,
}

impl Default for GrassParams {
    fn default() -> Self {
        Self {
            life: LifeParams {
                energy: 50.0,
                max_age: 200,
                reproduction_energy_cost: 20.0,
                reproduction_cooldown: 10,
                offspring_offset: 50.0,
            },
            base_growth_rate: 2.0,
            reproduction_chance: 0.3,
            competition_radius: 30.0,
            max_competition_effect: 0.8,
            producer_footprint: 50.0,
        }
    }
}

/// Animal parameters (herbivores and carnivores).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalParams {
    /// Shared life parameters.
    #[serde(flatten)]
    pub life: LifeParams,
    /// Reproduction requires an age strictly above this.
    pub min_reproductive_age: u32,
    /// Distance covered per tick.
    pub movement_speed: f64,
    /// Maximum distance at which food is perceived.
    pub detection_range: f64,
    /// Maximum distance at which food can be eaten or hunted.
    pub hunting_range: f64,
    /// Energy burned every tick.
    pub energy_consumption: f64,
    /// Baseline probability that a hunt succeeds.
    pub hunting_success_rate: f64,
    /// When set, a starving animal's success rate becomes
    /// `baseline + slope * (1 - age / max_age)`.
    #[serde(default)]
    pub starving_success_slope: Option<f64>,
    /// Ticks spent motionless after a successful hunt.
    pub hunting_cooldown_duration: u32,
    /// Species this animal eats, scanned in order.
    pub food_types: Vec<Species>,
}

impl AnimalParams {
    /// Reference herbivore: grazes deterministically, never rests.
    pub fn cow() -> Self {
        Self {
            life: LifeParams {
                energy: 100.0,
                max_age: 150,
                reproduction_energy_cost: 40.0,
                reproduction_cooldown: 20,
                offspring_offset: 10.0,
            },
            min_reproductive_age: 20,
            movement_speed: 2.0,
            detection_range: 800.0,
            hunting_range: 5.0,
            energy_consumption: 1.0,
            hunting_success_rate: 1.0,
            starving_success_slope: None,
            hunting_cooldown_duration: 0,
            food_types: vec![Species::Grass],
        }
    }

    /// Reference carnivore: fast, far-sighted, rests after a kill.
    pub fn tiger() -> Self {
        Self {
            life: LifeParams {
                energy: 150.0,
                max_age: 120,
                reproduction_energy_cost: 60.0,
                reproduction_cooldown: 30,
                offspring_offset: 40.0,
            },
            min_reproductive_age: 30,
            movement_speed: 4.0,
            detection_range: 1000.0,
            hunting_range: 5.0,
            energy_consumption: 2.0,
            hunting_success_rate: 0.3,
            starving_success_slope: Some(0.5),
            hunting_cooldown_duration: 15,
            food_types: vec![Species::Cow],
        }
    }
}

/// The per-kind behaviour table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTable {
    /// Producer parameters.
    #[serde(default)]
    pub grass: GrassParams,
    /// Herbivore parameters.
    #[serde(default = "AnimalParams::cow")]
    pub cow: AnimalParams,
    /// Carnivore parameters.
    #[serde(default = "AnimalParams::tiger")]
    pub tiger: AnimalParams,
}

impl SpeciesTable {
    /// Life parameters for any species.
    pub const fn life(&self, species: Species) -> &LifeParams {
        match species {
            Species::Grass => &self.grass.life,
            Species::Cow => &self.cow.life,
            Species::Tiger => &self.tiger.life,
        }
    }

    /// Check every behaviour constant the tick relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for species in Species::ALL {
            let life = self.life(species);
            positive(&format!("{species}.energy"), life.energy)?;
            non_negative(
                &format!("{species}.reproduction_energy_cost"),
                life.reproduction_energy_cost,
            )?;
            non_negative(&format!("{species}.offspring_offset"), life.offspring_offset)?;
        }

        let grass = &self.grass;
        non_negative("grass.base_growth_rate", grass.base_growth_rate)?;
        probability("grass.reproduction_chance", grass.reproduction_chance)?;
        positive("grass.competition_radius", grass.competition_radius)?;
        probability("grass.max_competition_effect", grass.max_competition_effect)?;
        positive("grass.producer_footprint", grass.producer_footprint)?;

        for species in [Species::Cow, Species::Tiger] {
            let Some(params) = self.animal(species) else {
                continue;
            };
            non_negative(&format!("{species}.movement_speed"), params.movement_speed)?;
            non_negative(&format!("{species}.detection_range"), params.detection_range)?;
            non_negative(&format!("{species}.hunting_range"), params.hunting_range)?;
            non_negative(&format!("{species}.energy_consumption"), params.energy_consumption)?;
            probability(
                &format!("{species}.hunting_success_rate"),
                params.hunting_success_rate,
            )?;
            if params
                .starving_success_slope
                .is_some_and(|slope| !slope.is_finite())
            {
                return Err(invalid(format!(
                    "{species}.starving_success_slope must be finite"
                )));
            }
            if params.food_types.contains(&species) {
                return Err(invalid(format!("{species} cannot list itself as food")));
            }
        }
        Ok(())
    }

    /// Animal parameters, or `None` for grass.
    pub const fn animal(&self, species: Species) -> Option<&AnimalParams> {
        match species {
            Species::Grass => None,
            Species::Cow => Some(&self.cow),
            Species::Tiger => Some(&self.tiger),
        }
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self {
            grass: GrassParams::default(),
            cow: AnimalParams::cow(),
            tiger: AnimalParams::tiger(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_world_width() -> f64 {
    800.0
}

const fn default_world_height() -> f64 {
    600.0
}

const fn default_initial_grass() -> u32 {
    100
}

const fn default_initial_cows() -> u32 {
    10
}

const fn default_initial_tigers() -> u32 {
    1
}

const fn default_target_rate() -> f64 {
    30.0
}

const fn default_initial_speed() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

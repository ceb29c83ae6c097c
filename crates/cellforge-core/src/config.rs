//! Configuration loading and typed config structures for the Cellforge engine.
//!
//! The canonical configuration lives in `cellforge-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every section is optional; missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use cellforge_entities::{EntityConfig, ExchangePolicy, GeneRanges};

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

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `cellforge-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run-level settings (name, seed, timing).
    #[serde(default)]
    pub world: WorldConfig,

    /// Population sizing, spawning, and root evolution.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Per-entity task cost and self-evolution tunables.
    #[serde(default)]
    pub entity: EntityConfig,

    /// Chromosome sampling ranges.
    #[serde(default)]
    pub genes: GeneRanges,

    /// Energy exchange thresholds.
    #[serde(default)]
    pub exchange: ExchangePolicy,

    /// Regeneration service settings.
    #[serde(default)]
    pub regeneration: RegenerationConfig,

    /// File locations for state and reports.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CELLFORGE_STATE_PATH` overrides `storage.state_path`
    /// - `CELLFORGE_SEED` overrides `world.seed`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply `CELLFORGE_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `CELLFORGE_SEED` is not a `u64`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("CELLFORGE_STATE_PATH") {
            self.storage.state_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("CELLFORGE_SEED") {
            let seed = val.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                field: String::from("CELLFORGE_SEED"),
                reason: e.to_string(),
            })?;
            self.world.seed = Some(seed);
        }
        Ok(())
    }

    /// Check every probability and range for usable values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |field: &str, value: f64| -> Result<(), ConfigError> {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field: field.to_owned(),
                    reason: format!("{value} is not in [0, 1]"),
                })
            }
        };

        let p = &self.population;
        unit("population.child_energy_min", p.child_energy_min)?;
        unit("population.child_energy_max", p.child_energy_max)?;
        if p.child_energy_min > p.child_energy_max {
            return Err(ConfigError::Invalid {
                field: String::from("population.child_energy_min"),
                reason: format!(
                    "{} exceeds child_energy_max {}",
                    p.child_energy_min, p.child_energy_max
                ),
            });
        }
        unit("population.evolution_chance", p.evolution_chance)?;
        unit("population.evolution_step", p.evolution_step)?;
        if p.root_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: String::from("population.root_id"),
                reason: String::from("must not be empty"),
            });
        }

        unit("regeneration.rate", self.regeneration.rate)?;

        if let Some(field) = self.entity.invalid_field() {
            return Err(ConfigError::Invalid {
                field: format!("entity.{field}"),
                reason: String::from("must be a number in [0, 1]"),
            });
        }
        if let Some(field) = self.exchange.invalid_field() {
            return Err(ConfigError::Invalid {
                field: format!("exchange.{field}"),
                reason: String::from("must be a number in [0, 1]"),
            });
        }
        self.genes.validate().map_err(|e| ConfigError::Invalid {
            field: String::from("genes"),
            reason: e.to_string(),
        })?;

        if self.world.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: String::from("world.tick_interval_ms"),
                reason: String::from("must be positive"),
            });
        }
        Ok(())
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Ticks to run before stopping (0 = until interrupted).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: None,
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Id of the root cell.
    #[serde(default = "default_root_id")]
    pub root_id: String,

    /// Children created before the first tick of a fresh run.
    #[serde(default = "default_initial_children")]
    pub initial_children: u32,

    /// Children created at the start of every tick.
    #[serde(default = "default_spawn_per_tick")]
    pub spawn_per_tick: u32,

    /// Lower bound of the random starting-energy draw for children.
    #[serde(default = "default_child_energy_min")]
    pub child_energy_min: f64,

    /// Upper bound of the random starting-energy draw for children.
    #[serde(default = "default_child_energy_max")]
    pub child_energy_max: f64,

    /// Probability per tick that the root attempts self-evolution.
    #[serde(default = "default_evolution_chance")]
    pub evolution_chance: f64,

    /// Evolution score gained per unit of root evolution potential.
    #[serde(default = "default_evolution_step")]
    pub evolution_step: f64,

    /// Persist state every N ticks (0 = only on shutdown).
    #[serde(default = "default_persist_every")]
    pub persist_every: u64,

    /// Task descriptors distributed each tick.
    #[serde(default = "default_task_pool")]
    pub task_pool: Vec<String>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            root_id: default_root_id(),
            initial_children: default_initial_children(),
            spawn_per_tick: default_spawn_per_tick(),
            child_energy_min: default_child_energy_min(),
            child_energy_max: default_child_energy_max(),
            evolution_chance: default_evolution_chance(),
            evolution_step: default_evolution_step(),
            persist_every: default_persist_every(),
            task_pool: default_task_pool(),
        }
    }
}

/// Regeneration service configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegenerationConfig {
    /// Probability that an attempt succeeds.
    #[serde(default = "default_regeneration_rate")]
    pub rate: f64,

    /// Optional JSON-lines file that every attempt is appended to.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            rate: default_regeneration_rate(),
            log_path: None,
        }
    }
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Population state document. `None` disables persistence.
    #[serde(default = "default_state_path")]
    pub state_path: Option<PathBuf>,

    /// Compliance report written on shutdown. `None` disables the export.
    #[serde(default = "default_compliance_path")]
    pub compliance_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            compliance_path: default_compliance_path(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    String::from("Cellforge")
}

const fn default_tick_interval_ms() -> u64 {
    2000
}

fn default_root_id() -> String {
    String::from("MOTHER_CELL_1")
}

const fn default_initial_children() -> u32 {
    5
}

const fn default_spawn_per_tick() -> u32 {
    1
}

const fn default_child_energy_min() -> f64 {
    0.6
}

const fn default_child_energy_max() -> f64 {
    1.0
}

const fn default_evolution_chance() -> f64 {
    0.3
}

const fn default_evolution_step() -> f64 {
    0.05
}

const fn default_persist_every() -> u64 {
    10
}

fn default_task_pool() -> Vec<String> {
    ["analyze_environment", "optimize_energy", "learn_pattern"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_regeneration_rate() -> f64 {
    0.25
}

fn default_state_path() -> Option<PathBuf> {
    Some(PathBuf::from("cellforge-state.json"))
}

fn default_compliance_path() -> Option<PathBuf> {
    Some(PathBuf::from("cellforge-compliance.json"))
}

fn default_log_level() -> String {
    String::from("info")
}

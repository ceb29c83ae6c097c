//! Probabilistic repair of the root cell and its entities.
//!
//! Each [`RegenerationService::attempt`] rolls once against the configured
//! rate. On success the root is repaired (damage cleared, energy restored)
//! and every entity is forced back to `active`. Every attempt, successful
//! or not, is appended to an in-memory log and, when configured, to a
//! JSON-lines file. Attempts are independent; there is no cooldown.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RegenerationConfig;
use crate::population::PopulationManager;

/// Errors raised when building a [`RegenerationService`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegenerationError {
    /// The success probability is not a number in `[0, 1]`.
    #[error("regeneration rate {rate} is not in [0, 1]")]
    InvalidRate {
        /// The rejected rate.
        rate: f64,
    },
}

/// One logged attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerationEvent {
    /// When the attempt happened.
    pub timestamp: DateTime<Utc>,
    /// Whether the repair ran.
    pub success: bool,
    /// Entities whose status was forced back to active.
    pub revived: usize,
}

/// Rolls for and applies regeneration.
#[derive(Debug)]
pub struct RegenerationService {
    rate: f64,
    log: Vec<RegenerationEvent>,
    log_path: Option<PathBuf>,
    last_success: Option<DateTime<Utc>>,
    rng: StdRng,
}

impl RegenerationService {
    /// Create a service with success probability `rate`.
    ///
    /// # Errors
    ///
    /// Returns [`RegenerationError::InvalidRate`] if `rate` is outside
    /// `[0, 1]` or not finite.
    pub fn new(rate: f64, rng: StdRng) -> Result<Self, RegenerationError> {
        if !(rate.is_finite() && (0.0..=1.0).contains(&rate)) {
            return Err(RegenerationError::InvalidRate { rate });
        }
        Ok(Self {
            rate,
            log: Vec::new(),
            log_path: None,
            last_success: None,
            rng,
        })
    }

    /// Build from config. A seed makes the roll sequence reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`RegenerationError::InvalidRate`] for a bad configured rate.
    pub fn from_config(
        config: &RegenerationConfig,
        seed: Option<u64>,
    ) -> Result<Self, RegenerationError> {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let mut service = Self::new(config.rate, rng)?;
        service.log_path.clone_from(&config.log_path);
        Ok(service)
    }

    /// Append every future attempt to `path` as one JSON object per line.
    #[must_use]
    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_path = Some(path);
        self
    }

    /// Success probability.
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Every attempt so far, oldest first.
    pub fn log(&self) -> &[RegenerationEvent] {
        &self.log
    }

    /// Time of the most recent successful attempt.
    pub const fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// Roll once and regenerate on success.
    pub fn attempt(&mut self, population: &mut PopulationManager) -> RegenerationEvent {
        let roll: f64 = self.rng.random();
        self.apply_roll(population, roll)
    }

    /// Regenerate if `roll` is below the rate. `roll` is a draw from
    /// `[0, 1)`.
    pub fn apply_roll(
        &mut self,
        population: &mut PopulationManager,
        roll: f64,
    ) -> RegenerationEvent {
        let timestamp = Utc::now();
        let success = roll < self.rate;
        let revived = if success {
            population.repair_root();
            let revived = population.revive_all();
            self.last_success = Some(timestamp);
            info!(revived, "Regeneration successful");
            revived
        } else {
            info!("Regeneration attempt failed");
            0
        };

        let event = RegenerationEvent {
            timestamp,
            success,
            revived,
        };
        if let Some(path) = &self.log_path {
            append_event(path, &event);
        }
        self.log.push(event.clone());
        event
    }
}

/// Append one event as a JSON line. Failures are logged and swallowed.
fn append_event(path: &Path, event: &RegenerationEvent) {
    let line = match serde_json::to_string(event) {
        Ok(line) => line,
        Err(e) => {
            warn!(error = %e, "Regeneration event not encodable");
            return;
        }
    };
    let written = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{line}"));
    if let Err(e) = written {
        warn!(path = %path.display(), error = %e, "Regeneration log write failed");
    }
}

//! Persisting and restoring the full population state.
//!
//! The state is a single pretty-printed JSON [`PopulationDocument`]. Writes
//! go to a sibling temporary file that is renamed over the target, so a
//! crash mid-write leaves the previous document intact.
//!
//! Restore is strict: a missing file is [`PopulationError::NotFound`], and
//! anything that does not parse or violates a bound (energy or trait outside
//! `[0, 1]`, duplicate ids, a document version newer than this build) is
//! [`PopulationError::MalformedState`]. Parent ids are not checked; they are
//! allowed to dangle after culling.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use tracing::info;

use cellforge_compliance::ComplianceMonitor;
use cellforge_entities::Entity;
use cellforge_types::{CURRENT_DOCUMENT_VERSION, PopulationDocument, RootRecord};

use crate::config::SimulationConfig;
use crate::error::PopulationError;
use crate::population::{PopulationManager, RootCell};

impl PopulationManager {
    /// Snapshot the full state as a document.
    pub fn to_document(&self) -> PopulationDocument {
        PopulationDocument {
            version: CURRENT_DOCUMENT_VERSION,
            root: RootRecord {
                id: self.root.id().clone(),
                energy: self.root.energy(),
                damage: self.root.damage(),
                repair_state: self.root.repair_state(),
                chromosome: *self.root.chromosome(),
            },
            generation: self.generation,
            tick: self.tick,
            entities: self.entities.values().map(Entity::to_record).collect(),
            evolution_score: self.evolution_score,
            evolution_history: self.evolution_history.clone(),
            compliance: self.compliance.records().clone(),
        }
    }

    /// Write the state to the configured `storage.state_path`.
    ///
    /// Returns `false` without touching disk when no path is configured.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::Io`] if the document cannot be written.
    pub fn persist(&self) -> Result<bool, PopulationError> {
        match &self.state_path {
            Some(path) => self.persist_to(path).map(|()| true),
            None => Ok(false),
        }
    }

    /// Write the state to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::Io`] if the document cannot be written.
    pub fn persist_to(&self, path: &Path) -> Result<(), PopulationError> {
        let io_err = |source| PopulationError::Io {
            path: path.to_path_buf(),
            source,
        };
        let document = self.to_document();
        let staging = staging_path(path);

        let file = File::create(&staging).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &document)
            .map_err(|e| io_err(std::io::Error::other(e)))?;
        writer.flush().map_err(io_err)?;
        drop(writer);
        fs::rename(&staging, path).map_err(io_err)?;

        info!(
            path = %path.display(),
            entities = document.entities.len(),
            generation = document.generation,
            "Population persisted"
        );
        Ok(())
    }

    /// Load a population from `path`. Tunables, RNG seed, and the state
    /// path for later writes come from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::NotFound`] if the file does not exist,
    /// [`PopulationError::MalformedState`] if it cannot be used, and
    /// [`PopulationError::Io`] for other read failures.
    pub fn restore(config: &SimulationConfig, path: &Path) -> Result<Self, PopulationError> {
        let mut population = Self::new(config);
        population.load_from(path)?;
        Ok(population)
    }

    /// Like [`restore`](Self::restore), drawing from `rng` afterwards.
    ///
    /// # Errors
    ///
    /// Same as [`restore`](Self::restore).
    pub fn restore_with_rng(
        config: &SimulationConfig,
        path: &Path,
        rng: StdRng,
    ) -> Result<Self, PopulationError> {
        let mut population = Self::with_rng(config, rng);
        population.load_from(path)?;
        Ok(population)
    }

    fn load_from(&mut self, path: &Path) -> Result<(), PopulationError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => PopulationError::NotFound {
                path: path.to_path_buf(),
            },
            _ => PopulationError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let document: PopulationDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| malformed(path, e.to_string()))?;
        self.apply_document(document)
            .map_err(|reason| malformed(path, reason))?;

        info!(
            path = %path.display(),
            entities = self.entities.len(),
            generation = self.generation,
            "Population restored"
        );
        Ok(())
    }

    /// Replace the current state with `document` after validating it.
    /// Nothing changes if validation fails.
    fn apply_document(&mut self, document: PopulationDocument) -> Result<(), String> {
        if document.version > CURRENT_DOCUMENT_VERSION {
            return Err(format!(
                "document version {} is newer than supported version {CURRENT_DOCUMENT_VERSION}",
                document.version
            ));
        }
        if document.version == 0 {
            return Err(String::from("document version 0 is not supported"));
        }
        if !document.evolution_score.is_finite() {
            return Err(String::from("evolution_score is not a finite number"));
        }

        let root = document.root;
        if let Some(gene) = root.chromosome.out_of_range_gene() {
            return Err(format!("root gene {gene:?} is outside [0, 1]"));
        }
        if !(root.damage.is_finite() && (0.0..=1.0).contains(&root.damage)) {
            return Err(format!("root damage {} is outside [0, 1]", root.damage));
        }

        let mut seen = BTreeSet::new();
        let mut entities = BTreeMap::new();
        for record in document.entities {
            if record.id == root.id || !seen.insert(record.id.clone()) {
                return Err(format!("duplicate entity id {}", record.id));
            }
            let entity = Entity::from_record(record).map_err(|e| e.to_string())?;
            entities.insert(entity.id().clone(), entity);
        }

        let compliance =
            ComplianceMonitor::from_records(document.compliance).map_err(|e| e.to_string())?;

        self.root = RootCell::from_parts(
            root.id,
            root.energy,
            root.damage,
            root.repair_state,
            root.chromosome,
        );
        self.entities = entities;
        self.generation_fitness.clear();
        self.generation = document.generation;
        self.tick = document.tick;
        self.evolution_score = document.evolution_score;
        self.evolution_history = document.evolution_history;
        self.compliance = compliance;
        Ok(())
    }
}

fn malformed(path: &Path, reason: String) -> PopulationError {
    PopulationError::MalformedState {
        path: path.to_path_buf(),
        reason,
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

//! The population manager: the root cell and the entity set it owns.
//!
//! The manager is the only component that adds or removes entities. It
//! creates children (and deeper descendants) through the chromosome
//! generator, runs generational evaluation and culling, drives root
//! self-evolution, and brokers energy sharing between members.
//!
//! Parent links are plain ids. A culled parent leaves its descendants with
//! a dangling `parent_id`; nothing ever dereferences it.
//!
//! All randomness comes from one seeded [`StdRng`] held by the manager, so
//! two managers built from the same seed evolve identically.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use cellforge_compliance::{ComplianceMonitor, Verdict};
use cellforge_entities::{
    ChromosomeGenerator, DistributionReport, Entity, EntityConfig, EntityError, ExchangePolicy,
    Execution, IneligibleTransfer, SelfEvolution, TransferResult, distribute,
};
use cellforge_types::{
    Chromosome, ComplianceStatus, Energy, EntityId, EntityStatus, EvolutionRecord, Gene,
    RepairState, Task, clamp_unit,
};

use crate::bridge::{SignalBridge, SignalSummary};
use crate::config::{PopulationConfig, SimulationConfig};
use crate::error::PopulationError;

/// Evolution score a fresh root starts with.
pub const INITIAL_EVOLUTION_SCORE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Root cell
// ---------------------------------------------------------------------------

/// Vitals of the root cell that owns the population.
#[derive(Debug, Clone, PartialEq)]
pub struct RootCell {
    id: EntityId,
    energy: Energy,
    damage: f64,
    repair_state: RepairState,
    chromosome: Chromosome,
}

impl RootCell {
    /// A healthy root at full energy.
    pub const fn new(id: EntityId, chromosome: Chromosome) -> Self {
        Self {
            id,
            energy: Energy::FULL,
            damage: 0.0,
            repair_state: RepairState::Idle,
            chromosome,
        }
    }

    pub(crate) const fn from_parts(
        id: EntityId,
        energy: Energy,
        damage: f64,
        repair_state: RepairState,
        chromosome: Chromosome,
    ) -> Self {
        Self {
            id,
            energy,
            damage,
            repair_state,
            chromosome,
        }
    }

    /// Root id.
    pub const fn id(&self) -> &EntityId {
        &self.id
    }

    /// Root energy.
    pub const fn energy(&self) -> Energy {
        self.energy
    }

    /// Accumulated damage in `[0.0, 1.0]`.
    pub const fn damage(&self) -> f64 {
        self.damage
    }

    /// Whether a repair is pending.
    pub const fn repair_state(&self) -> RepairState {
        self.repair_state
    }

    /// Root trait vector.
    pub const fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    /// Raise damage by `amount` and drain the same amount of energy.
    ///
    /// Returns the new damage level.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::Entity`] if `amount` is negative or not
    /// finite.
    pub fn inflict_damage(&mut self, amount: f64) -> Result<f64, PopulationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(EntityError::InvalidArgument {
                reason: format!("damage must be a non-negative number, got {amount}"),
            }
            .into());
        }
        self.damage = clamp_unit(self.damage + amount);
        self.energy = self.energy.saturating_sub(amount);
        if self.damage > 0.0 {
            self.repair_state = RepairState::Repairing;
        }
        warn!(
            root_id = %self.id,
            damage = self.damage,
            energy = self.energy.value(),
            "Root damaged"
        );
        Ok(self.damage)
    }

    /// Clear damage and restore full energy.
    pub fn repair(&mut self) {
        self.damage = 0.0;
        self.energy = Energy::FULL;
        self.repair_state = RepairState::Idle;
        info!(root_id = %self.id, "Root repaired");
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CullReport {
    /// Generation number after the cycle.
    pub generation: u64,
    /// Mean fitness the population was measured against.
    pub average: f64,
    /// Survivors, in id order.
    pub retained: Vec<EntityId>,
    /// Removed entities, in id order.
    pub culled: Vec<EntityId>,
}

/// Outcome of a root self-evolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RootEvolution {
    /// The root evolved.
    Evolved {
        /// Evolution score after the step.
        score: f64,
        /// Root energy after the decay.
        energy: f64,
        /// Root performance after the gain.
        performance: f64,
    },
    /// Energy or evolution potential was too low.
    ConditionsNotMet,
}

/// One energy transfer made while balancing the population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyTransfer {
    /// Donor.
    pub source: EntityId,
    /// Recipient.
    pub target: EntityId,
    /// Energy moved.
    pub amount: f64,
    /// Whether the recipient was moved from resting back to active.
    pub reactivated: bool,
}

#[derive(Serialize)]
struct SignalPayload<'a> {
    entity_id: &'a EntityId,
    generation: u32,
    chromosome: &'a Chromosome,
}

// ---------------------------------------------------------------------------
// Population manager
// ---------------------------------------------------------------------------

/// Owns the root cell, every entity, and the compliance log.
#[derive(Debug)]
pub struct PopulationManager {
    pub(crate) root: RootCell,
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    pub(crate) generation_fitness: BTreeMap<EntityId, f64>,
    pub(crate) generation: u64,
    pub(crate) tick: u64,
    pub(crate) evolution_score: f64,
    pub(crate) evolution_history: Vec<EvolutionRecord>,
    pub(crate) compliance: ComplianceMonitor,
    generator: ChromosomeGenerator,
    entity_config: EntityConfig,
    exchange: ExchangePolicy,
    settings: PopulationConfig,
    pub(crate) state_path: Option<PathBuf>,
    rng: StdRng,
}

impl PopulationManager {
    /// Create an empty population. The RNG is seeded from `world.seed`, or
    /// from the OS when no seed is configured.
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = config
            .world
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::with_rng(config, rng)
    }

    /// Create an empty population drawing from `rng`.
    pub fn with_rng(config: &SimulationConfig, mut rng: StdRng) -> Self {
        let generator = ChromosomeGenerator::new(config.genes);
        let root = RootCell::new(
            EntityId::from(config.population.root_id.as_str()),
            generator.generate(&mut rng),
        );
        info!(root_id = %root.id, "Population created");

        Self {
            root,
            entities: BTreeMap::new(),
            generation_fitness: BTreeMap::new(),
            generation: 0,
            tick: 0,
            evolution_score: INITIAL_EVOLUTION_SCORE,
            evolution_history: Vec::new(),
            compliance: ComplianceMonitor::new(),
            generator,
            entity_config: config.entity.clone(),
            exchange: config.exchange.clone(),
            settings: config.population.clone(),
            state_path: config.storage.state_path.clone(),
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The root cell.
    pub const fn root(&self) -> &RootCell {
        &self.root
    }

    /// Mutable access to the root cell.
    pub const fn root_mut(&mut self) -> &mut RootCell {
        &mut self.root
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no live entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity.
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up an entity for mutation.
    pub fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Every live entity in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Ids of entities with the given status, in id order.
    pub fn ids_with_status(&self, status: EntityStatus) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.status() == status)
            .map(|e| e.id().clone())
            .collect()
    }

    /// Completed evaluation cycles.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Last tick recorded by the tick cycle. Survives persist and restore.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Fitness values from the most recent evaluation cycle.
    pub const fn generation_fitness(&self) -> &BTreeMap<EntityId, f64> {
        &self.generation_fitness
    }

    /// Root-level evolution aggregate.
    pub const fn evolution_score(&self) -> f64 {
        self.evolution_score
    }

    /// Successful root evolutions, oldest first.
    pub fn evolution_history(&self) -> &[EvolutionRecord] {
        &self.evolution_history
    }

    /// The compliance log.
    pub const fn compliance(&self) -> &ComplianceMonitor {
        &self.compliance
    }

    /// Population-wide compliance verdict.
    pub fn compliance_verdict(&self) -> Verdict {
        self.compliance.verdict()
    }

    /// Per-entity tunables in effect.
    pub const fn entity_config(&self) -> &EntityConfig {
        &self.entity_config
    }

    /// Where [`persist`](Self::persist) writes, if anywhere.
    pub fn state_path(&self) -> Option<&std::path::Path> {
        self.state_path.as_deref()
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a child of the root with a fresh chromosome.
    ///
    /// Starting energy is `uniform(child_energy_min, child_energy_max) *
    /// energy_efficiency`.
    pub fn spawn_child(&mut self) -> &Entity {
        let chromosome = self.generator.generate(&mut self.rng);
        let draw = self.draw_child_energy();
        let energy = Energy::new(draw * chromosome.energy_efficiency);
        let entity = Entity::new(
            EntityId::child(),
            self.root.id.clone(),
            1,
            energy,
            chromosome,
        );
        self.insert(entity)
    }

    /// Create an entity under `parent_id`, which must be the root or a live
    /// entity. Children of the root go through [`spawn_child`]; deeper
    /// descendants start at full energy.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::UnknownParent`] if `parent_id` is neither.
    ///
    /// [`spawn_child`]: Self::spawn_child
    pub fn create_entity(&mut self, parent_id: &EntityId) -> Result<&Entity, PopulationError> {
        if *parent_id == self.root.id {
            return Ok(self.spawn_child());
        }

        let Some(parent) = self.entities.get(parent_id) else {
            return Err(PopulationError::UnknownParent {
                parent_id: parent_id.clone(),
            });
        };
        let generation = parent.generation().saturating_add(1);

        let chromosome = self.generator.generate(&mut self.rng);
        let entity = Entity::new(
            EntityId::grandchild(),
            parent_id.clone(),
            generation,
            Energy::FULL,
            chromosome,
        );
        Ok(self.insert(entity))
    }

    fn insert(&mut self, entity: Entity) -> &Entity {
        info!(
            entity_id = %entity.id(),
            parent_id = %entity.parent_id(),
            generation = entity.generation(),
            energy = entity.energy().value(),
            "Entity created"
        );
        self.entities.entry(entity.id().clone()).or_insert(entity)
    }

    fn draw_child_energy(&mut self) -> f64 {
        let lo = self.settings.child_energy_min;
        let hi = self.settings.child_energy_max;
        if lo < hi {
            self.rng.random_range(lo..=hi)
        } else {
            lo
        }
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Hand `tasks` to the listed entities in cyclic order.
    ///
    /// `ids[i]` receives `tasks[i % tasks.len()]`. An id listed twice
    /// receives one task per occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::UnknownEntity`] if any id is not live (no
    /// task is assigned in that case), or [`PopulationError::Entity`] with
    /// `EmptyTaskList` if `tasks` is empty.
    pub fn assign_tasks(
        &mut self,
        ids: &[EntityId],
        tasks: &[Task],
    ) -> Result<DistributionReport, PopulationError> {
        if let Some(missing) = ids.iter().find(|id| !self.entities.contains_key(*id)) {
            return Err(PopulationError::UnknownEntity {
                entity_id: missing.clone(),
            });
        }

        if tasks.is_empty() {
            return Err(EntityError::EmptyTaskList.into());
        }

        let mut report = DistributionReport::default();
        for (id, task) in ids.iter().zip(tasks.iter().cycle()) {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            let single = distribute(std::iter::once(entity), std::slice::from_ref(task))?;
            report.assignments.extend(single.assignments);
            report.failures.extend(single.failures);
        }
        Ok(report)
    }

    /// Hand `tasks` to every active entity, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::Entity`] with `EmptyTaskList` if `tasks`
    /// is empty.
    pub fn distribute_to_active(
        &mut self,
        tasks: &[Task],
    ) -> Result<DistributionReport, PopulationError> {
        let active = self
            .entities
            .values_mut()
            .filter(|e| e.status() == EntityStatus::Active);
        Ok(distribute(active, tasks)?)
    }

    /// Run the head task of one entity.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::UnknownEntity`] for an unknown id, or
    /// [`PopulationError::Entity`] if the entity is inactive.
    pub fn execute_next_task(&mut self, id: &EntityId) -> Result<Execution, PopulationError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| PopulationError::UnknownEntity {
                entity_id: id.clone(),
            })?;
        Ok(entity.execute_next_task(&self.entity_config, &mut self.compliance)?)
    }

    /// Record a `failed` compliance entry for a task that never ran.
    pub fn record_failure(&mut self, id: &EntityId, task: &Task, error: String) -> u64 {
        self.compliance.record(
            id,
            task,
            ComplianceStatus::Failed,
            Some(error),
        )
    }

    // -----------------------------------------------------------------------
    // Status and energy
    // -----------------------------------------------------------------------

    /// Move an entity back to active. The only way out of `inactive`.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::UnknownEntity`] for an unknown id.
    pub fn reactivate(&mut self, id: &EntityId) -> Result<(), PopulationError> {
        self.entity_or_err(id)?.set_status(EntityStatus::Active);
        info!(entity_id = %id, "Entity reactivated");
        Ok(())
    }

    /// Take an entity out of service until it is reactivated.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::UnknownEntity`] for an unknown id.
    pub fn deactivate(&mut self, id: &EntityId) -> Result<(), PopulationError> {
        self.entity_or_err(id)?.set_status(EntityStatus::Inactive);
        info!(entity_id = %id, "Entity deactivated");
        Ok(())
    }

    /// Give an entity energy, waking it if it was resting and is now above
    /// the rest threshold. Inactive entities stay inactive.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::UnknownEntity`] for an unknown id, or
    /// [`PopulationError::Entity`] for a negative amount.
    pub fn feed(&mut self, id: &EntityId, amount: f64) -> Result<Energy, PopulationError> {
        let threshold = self.entity_config.energy_threshold;
        let entity = self.entity_or_err(id)?;
        let energy = entity.receive_energy(amount)?;
        wake_if_recovered(entity, threshold);
        Ok(energy)
    }

    /// Apply the exchange policy from `source_id` to `target_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::UnknownEntity`] if either id is not live.
    pub fn share_energy(
        &mut self,
        source_id: &EntityId,
        target_id: &EntityId,
    ) -> Result<TransferResult, PopulationError> {
        if source_id == target_id {
            self.entity_or_err(source_id)?;
            return Ok(TransferResult::Ineligible(IneligibleTransfer::SameEntity));
        }

        let mut source =
            self.entities
                .remove(source_id)
                .ok_or_else(|| PopulationError::UnknownEntity {
                    entity_id: source_id.clone(),
                })?;
        let result = match self.entities.get_mut(target_id) {
            Some(target) => Ok(self.exchange.transfer(&mut source, target)),
            None => Err(PopulationError::UnknownEntity {
                entity_id: target_id.clone(),
            }),
        };
        self.entities.insert(source_id.clone(), source);
        result
    }

    /// Pair every low-energy entity with the richest eligible donor.
    ///
    /// Recipients are served poorest first. Resting recipients pushed above
    /// the rest threshold are moved back to active. Inactive entities take
    /// no part.
    pub fn balance_energy(&mut self) -> Vec<EnergyTransfer> {
        let threshold = self.entity_config.energy_threshold;
        let mut recipients: Vec<(EntityId, f64)> = self
            .entities
            .values()
            .filter(|e| e.status() != EntityStatus::Inactive)
            .filter(|e| self.exchange.can_receive(e.energy()))
            .map(|e| (e.id().clone(), e.energy().value()))
            .collect();
        recipients.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut transfers = Vec::new();
        for (target_id, _) in recipients {
            let donor = self
                .entities
                .values()
                .filter(|e| e.status() != EntityStatus::Inactive && *e.id() != target_id)
                .filter(|e| self.exchange.can_donate(e.energy()))
                .max_by(|a, b| a.energy().value().total_cmp(&b.energy().value()))
                .map(|e| e.id().clone());
            let Some(source_id) = donor else {
                continue;
            };

            match self.share_energy(&source_id, &target_id) {
                Ok(TransferResult::Transferred { amount, .. }) => {
                    let reactivated = self
                        .entities
                        .get_mut(&target_id)
                        .is_some_and(|target| wake_if_recovered(target, threshold));
                    transfers.push(EnergyTransfer {
                        source: source_id,
                        target: target_id,
                        amount,
                        reactivated,
                    });
                }
                Ok(TransferResult::Ineligible(reason)) => {
                    debug!(source = %source_id, target = %target_id, %reason, "Pair skipped");
                }
                Err(e) => warn!(error = %e, "Energy balancing lookup failed"),
            }
        }
        transfers
    }

    fn entity_or_err(&mut self, id: &EntityId) -> Result<&mut Entity, PopulationError> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| PopulationError::UnknownEntity {
                entity_id: id.clone(),
            })
    }

    // -----------------------------------------------------------------------
    // Evolution
    // -----------------------------------------------------------------------

    /// Let every non-inactive entity attempt self-evolution. Returns the ids
    /// that evolved.
    pub fn evolve_entities(&mut self) -> Vec<EntityId> {
        let config = &self.entity_config;
        self.entities
            .values_mut()
            .filter(|e| e.status() != EntityStatus::Inactive)
            .filter_map(|e| match e.self_evolve(config) {
                SelfEvolution::Evolved { .. } => Some(e.id().clone()),
                SelfEvolution::ConditionsNotMet => None,
            })
            .collect()
    }

    /// Evolve the root if its energy and evolution potential clear the
    /// same gate entities use.
    ///
    /// On success root energy decays, root performance rises, the
    /// evolution score grows by `evolution_step * evolution_potential`, and
    /// a history entry is appended.
    pub fn self_evolve(&mut self) -> RootEvolution {
        let config = &self.entity_config;
        if self.root.energy.value() < config.evolve_energy_min
            || self.root.chromosome.evolution_potential <= config.evolve_potential_min
        {
            debug!(
                root_id = %self.root.id,
                energy = self.root.energy.value(),
                evolution_potential = self.root.chromosome.evolution_potential,
                "Root evolution conditions not met"
            );
            return RootEvolution::ConditionsNotMet;
        }

        self.root.energy = self.root.energy.scale(config.evolve_energy_decay);
        let performance = self
            .root
            .chromosome
            .boost(Gene::Performance, config.evolve_performance_gain);
        self.evolution_score +=
            self.settings.evolution_step * self.root.chromosome.evolution_potential;
        self.evolution_history.push(EvolutionRecord {
            timestamp: Utc::now(),
            score: self.evolution_score,
        });

        info!(
            root_id = %self.root.id,
            score = self.evolution_score,
            energy = self.root.energy.value(),
            performance,
            "Root evolved"
        );
        RootEvolution::Evolved {
            score: self.evolution_score,
            energy: self.root.energy.value(),
            performance,
        }
    }

    /// Attempt [`self_evolve`](Self::self_evolve) with probability
    /// `evolution_chance`. `None` means the roll failed.
    pub fn maybe_self_evolve(&mut self) -> Option<RootEvolution> {
        let roll: f64 = self.rng.random();
        (roll < self.settings.evolution_chance).then(|| self.self_evolve())
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Score every entity as `uniform(0, 1) * learning` and cull those
    /// below the mean.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::EmptyPopulation`] if there is nothing to
    /// evaluate.
    pub fn evaluate_and_cull(&mut self) -> Result<CullReport, PopulationError> {
        if self.entities.is_empty() {
            return Err(PopulationError::EmptyPopulation);
        }
        let mut fitness = BTreeMap::new();
        for entity in self.entities.values() {
            let draw: f64 = self.rng.random();
            fitness.insert(entity.id().clone(), draw * entity.chromosome().learning);
        }
        self.cull_by_fitness(fitness)
    }

    /// Retain entities whose fitness is at least the population mean.
    ///
    /// Entities missing from `fitness` score `0.0`. Entries for unknown ids
    /// are ignored. The scores replace the previous generation's.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::EmptyPopulation`] if there is nothing to
    /// evaluate.
    pub fn cull_by_fitness(
        &mut self,
        mut fitness: BTreeMap<EntityId, f64>,
    ) -> Result<CullReport, PopulationError> {
        if self.entities.is_empty() {
            return Err(PopulationError::EmptyPopulation);
        }
        fitness.retain(|id, _| self.entities.contains_key(id));
        for id in self.entities.keys() {
            fitness.entry(id.clone()).or_insert(0.0);
        }

        let total: f64 = fitness.values().sum();
        let count = f64::from(u32::try_from(fitness.len()).unwrap_or(u32::MAX));
        // Rounding in the sum can lift the mean above tied scores.
        let best = fitness.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let average = (total / count).min(best);

        let mut retained = Vec::new();
        let mut culled = Vec::new();
        for (id, score) in &fitness {
            if *score >= average {
                retained.push(id.clone());
            } else {
                culled.push(id.clone());
            }
        }

        for id in &culled {
            self.entities.remove(id);
            debug!(entity_id = %id, "Entity culled");
        }
        self.generation = self.generation.saturating_add(1);
        self.generation_fitness = fitness;

        info!(
            generation = self.generation,
            average,
            retained = retained.len(),
            culled = culled.len(),
            "Generation evaluated"
        );
        Ok(CullReport {
            generation: self.generation,
            average,
            retained,
            culled,
        })
    }

    // -----------------------------------------------------------------------
    // Repair and signals
    // -----------------------------------------------------------------------

    /// Repair the root cell.
    pub fn repair_root(&mut self) {
        self.root.repair();
    }

    /// Force every entity to active. Returns how many changed status.
    pub fn revive_all(&mut self) -> usize {
        let mut revived = 0usize;
        for entity in self.entities.values_mut() {
            if entity.status() != EntityStatus::Active {
                entity.set_status(EntityStatus::Active);
                revived = revived.saturating_add(1);
            }
        }
        revived
    }

    /// Send each entity's chromosome through `bridge`.
    ///
    /// A missing response counts as the collaborator being unavailable and
    /// never fails the broadcast.
    pub fn broadcast(&self, bridge: &mut dyn SignalBridge) -> SignalSummary {
        let mut summary = SignalSummary::default();
        for entity in self.entities.values() {
            let payload = SignalPayload {
                entity_id: entity.id(),
                generation: entity.generation(),
                chromosome: entity.chromosome(),
            };
            let value = match serde_json::to_value(&payload) {
                Ok(value) => value,
                Err(e) => {
                    warn!(entity_id = %entity.id(), error = %e, "Signal payload not encodable");
                    summary.unavailable = summary.unavailable.saturating_add(1);
                    continue;
                }
            };
            summary.sent = summary.sent.saturating_add(1);
            match bridge.send_signal(&value) {
                Some(response) => {
                    debug!(entity_id = %entity.id(), %response, "Signal acknowledged");
                    summary.acknowledged = summary.acknowledged.saturating_add(1);
                }
                None => summary.unavailable = summary.unavailable.saturating_add(1),
            }
        }
        if summary.unavailable > 0 {
            debug!(unavailable = summary.unavailable, "Signal bridge unavailable for some entities");
        }
        summary
    }
}

/// Move a resting entity back to active once its energy clears `threshold`.
fn wake_if_recovered(entity: &mut Entity, threshold: f64) -> bool {
    if entity.status() == EntityStatus::Resting && entity.energy().value() > threshold {
        entity.set_status(EntityStatus::Active);
        true
    } else {
        false
    }
}

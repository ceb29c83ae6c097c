//! Population members and their lifecycle operations.
//!
//! An [`Entity`] owns its energy, a FIFO task queue, and a chromosome. It
//! never removes itself from the population; only the cull step of the
//! population manager does that.
//!
//! # Task execution
//!
//! ```text
//! cost = base_cost * (1 - performance)
//! ```
//!
//! 1. Inactive entities refuse with [`EntityError::InvalidState`].
//! 2. An empty queue is a no-op ([`Execution::NoTaskAvailable`]).
//! 3. If energy is depleted or below `cost`, the head task stays queued,
//!    the entity rests, and a `pending` compliance record is written.
//! 4. Otherwise the head task is popped, energy drops by `cost`, the
//!    completion counter increments, and a `completed` record is written.
//!    Energy at or below the rest threshold moves the entity to resting.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use cellforge_compliance::ComplianceMonitor;
use cellforge_types::{
    Chromosome, ComplianceStatus, Energy, EntityId, EntityRecord, EntityStatus, Gene, Task,
};

use crate::config::EntityConfig;
use crate::error::EntityError;

/// Error message attached to `pending` records for refused executions.
pub const INSUFFICIENT_ENERGY: &str = "insufficient energy";

/// Result of [`Entity::execute_next_task`].
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// The head task ran.
    Completed {
        /// The task that ran.
        task: Task,
        /// Energy spent.
        cost: f64,
        /// Energy after the deduction.
        energy: Energy,
        /// Whether the entity dropped to resting as a result.
        rested: bool,
    },
    /// Energy was insufficient; the task is still at the head of the queue.
    Refused {
        /// The task left in place.
        task: Task,
        /// Energy the task would have needed.
        required: f64,
        /// Energy the entity had.
        available: Energy,
    },
    /// The queue was empty.
    NoTaskAvailable,
}

/// Result of [`Entity::self_evolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelfEvolution {
    /// Energy was spent and performance improved.
    Evolved {
        /// Energy after the decay.
        energy: Energy,
        /// Performance after the gain.
        performance: f64,
    },
    /// Energy or evolution potential was too low; nothing changed.
    ConditionsNotMet,
}

/// A member of the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    parent_id: EntityId,
    generation: u32,
    status: EntityStatus,
    energy: Energy,
    tasks: VecDeque<Task>,
    chromosome: Chromosome,
    completed_count: u64,
    created_at: DateTime<Utc>,
}

impl Entity {
    /// Create an active entity with an empty queue.
    pub fn new(
        id: EntityId,
        parent_id: EntityId,
        generation: u32,
        energy: Energy,
        chromosome: Chromosome,
    ) -> Self {
        Self {
            id,
            parent_id,
            generation,
            status: EntityStatus::Active,
            energy,
            tasks: VecDeque::new(),
            chromosome,
            completed_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Rebuild an entity from its persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::InvalidArgument`] if a chromosome trait is
    /// outside `[0.0, 1.0]`. Energy bounds are already enforced by
    /// deserialization.
    pub fn from_record(record: EntityRecord) -> Result<Self, EntityError> {
        if let Some(gene) = record.chromosome.out_of_range_gene() {
            return Err(EntityError::InvalidArgument {
                reason: format!(
                    "entity {} has {gene:?} = {} outside [0, 1]",
                    record.id,
                    record.chromosome.get(gene)
                ),
            });
        }

        Ok(Self {
            id: record.id,
            parent_id: record.parent_id,
            generation: record.generation,
            status: record.status,
            energy: record.energy,
            tasks: record.tasks.into(),
            chromosome: record.chromosome,
            completed_count: record.completed_count,
            created_at: record.created_at,
        })
    }

    /// Snapshot the entity as a persisted record.
    pub fn to_record(&self) -> EntityRecord {
        EntityRecord {
            id: self.id.clone(),
            parent_id: self.parent_id.clone(),
            generation: self.generation,
            status: self.status,
            energy: self.energy,
            tasks: self.tasks.iter().cloned().collect(),
            chromosome: self.chromosome,
            completed_count: self.completed_count,
            created_at: self.created_at,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Unique id.
    pub const fn id(&self) -> &EntityId {
        &self.id
    }

    /// Id of the creator. Informational only; may dangle after a cull.
    pub const fn parent_id(&self) -> &EntityId {
        &self.parent_id
    }

    /// Depth below the root.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Lifecycle status.
    pub const fn status(&self) -> EntityStatus {
        self.status
    }

    /// Current energy.
    pub const fn energy(&self) -> Energy {
        self.energy
    }

    /// Trait vector.
    pub const fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    /// Tasks executed to completion.
    pub const fn completed_count(&self) -> u64 {
        self.completed_count
    }

    /// Creation time.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Queued tasks, head first.
    pub fn tasks(&self) -> impl ExactSizeIterator<Item = &Task> {
        self.tasks.iter()
    }

    /// The task that would run next.
    pub fn next_task(&self) -> Option<&Task> {
        self.tasks.front()
    }

    /// Energy the next task will cost this entity.
    pub fn task_cost(&self, config: &EntityConfig) -> f64 {
        config.task_cost(self.chromosome.performance)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Append a task to the queue. Returns the new queue length.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::InvalidState`] if the entity is inactive.
    pub fn assign_task(&mut self, task: Task) -> Result<usize, EntityError> {
        if !self.status.accepts_tasks() {
            return Err(self.invalid_state("accept a task"));
        }
        debug!(entity_id = %self.id, %task, queued = self.tasks.len(), "Task assigned");
        self.tasks.push_back(task);
        Ok(self.tasks.len())
    }

    /// Run the head task if energy allows, recording the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::InvalidState`] if the entity is inactive.
    pub fn execute_next_task(
        &mut self,
        config: &EntityConfig,
        monitor: &mut ComplianceMonitor,
    ) -> Result<Execution, EntityError> {
        if self.status == EntityStatus::Inactive {
            return Err(self.invalid_state("execute a task"));
        }

        let Some(task) = self.tasks.front().cloned() else {
            return Ok(Execution::NoTaskAvailable);
        };

        let cost = self.task_cost(config);
        if self.energy.is_depleted() || self.energy.value() < cost {
            self.status = EntityStatus::Resting;
            monitor.record(
                &self.id,
                &task,
                ComplianceStatus::Pending,
                Some(String::from(INSUFFICIENT_ENERGY)),
            );
            debug!(
                entity_id = %self.id,
                %task,
                required = cost,
                available = self.energy.value(),
                "Task refused, entity resting"
            );
            return Ok(Execution::Refused {
                task,
                required: cost,
                available: self.energy,
            });
        }

        self.tasks.pop_front();
        self.energy = self.energy.saturating_sub(cost);
        self.completed_count = self.completed_count.saturating_add(1);

        let rested = self.energy.value() <= config.energy_threshold;
        if rested {
            self.status = EntityStatus::Resting;
            debug!(entity_id = %self.id, energy = self.energy.value(), "Entity resting");
        }

        monitor.record(&self.id, &task, ComplianceStatus::Completed, None);

        Ok(Execution::Completed {
            task,
            cost,
            energy: self.energy,
            rested,
        })
    }

    /// Add energy, saturating at full. Status is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::InvalidArgument`] if `amount` is negative or
    /// not finite.
    pub fn receive_energy(&mut self, amount: f64) -> Result<Energy, EntityError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(EntityError::InvalidArgument {
                reason: format!("energy amount must be a non-negative number, got {amount}"),
            });
        }
        self.energy = self.energy.saturating_add(amount);
        Ok(self.energy)
    }

    /// Spend energy to improve performance when the gate is met.
    pub fn self_evolve(&mut self, config: &EntityConfig) -> SelfEvolution {
        if self.energy.value() < config.evolve_energy_min
            || self.chromosome.evolution_potential <= config.evolve_potential_min
        {
            debug!(entity_id = %self.id, "Self-evolution conditions not met");
            return SelfEvolution::ConditionsNotMet;
        }

        self.energy = self.energy.scale(config.evolve_energy_decay);
        let performance = self
            .chromosome
            .boost(Gene::Performance, config.evolve_performance_gain);

        info!(
            entity_id = %self.id,
            energy = self.energy.value(),
            performance,
            "Entity evolved"
        );
        SelfEvolution::Evolved {
            energy: self.energy,
            performance,
        }
    }

    /// Overwrite the status. No validation; callers keep transitions sane.
    pub fn set_status(&mut self, status: EntityStatus) {
        if self.status != status {
            debug!(entity_id = %self.id, from = %self.status, to = %status, "Status changed");
        }
        self.status = status;
    }

    pub(crate) const fn set_energy(&mut self, energy: Energy) {
        self.energy = energy;
    }

    fn invalid_state(&self, operation: &'static str) -> EntityError {
        EntityError::InvalidState {
            entity_id: self.id.clone(),
            status: self.status,
            operation,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn entity(energy: f64, performance: f64, evolution_potential: f64) -> Entity {
        let mut chromosome = Chromosome::from_fn(|_| 0.6);
        chromosome.performance = performance;
        chromosome.evolution_potential = evolution_potential;
        Entity::new(
            EntityId::from("CHILD_1"),
            EntityId::from("ROOT"),
            1,
            Energy::new(energy),
            chromosome,
        )
    }

    #[test]
    fn assign_appends_in_fifo_order() {
        let mut e = entity(1.0, 0.5, 0.5);
        e.assign_task(Task::from("t0")).unwrap();
        let len = e.assign_task(Task::from("t1")).unwrap();
        assert_eq!(len, 2);
        assert_eq!(e.next_task(), Some(&Task::from("t0")));
    }

    #[test]
    fn inactive_entity_rejects_tasks() {
        let mut e = entity(1.0, 0.5, 0.5);
        e.set_status(EntityStatus::Inactive);
        let err = e.assign_task(Task::from("t0")).unwrap_err();
        assert!(matches!(
            err,
            EntityError::InvalidState {
                status: EntityStatus::Inactive,
                ..
            }
        ));
    }

    #[test]
    fn resting_entity_still_accepts_tasks() {
        let mut e = entity(0.2, 0.5, 0.5);
        e.set_status(EntityStatus::Resting);
        assert!(e.assign_task(Task::from("t0")).is_ok());
    }

    #[test]
    fn execute_on_empty_queue_is_noop() {
        let mut e = entity(1.0, 0.5, 0.5);
        let mut monitor = ComplianceMonitor::new();
        let outcome = e.execute_next_task(&EntityConfig::default(), &mut monitor);
        assert_eq!(outcome, Ok(Execution::NoTaskAvailable));
        assert!(monitor.is_empty());
        assert_eq!(e.status(), EntityStatus::Active);
    }

    #[test]
    fn execute_deducts_cost_and_records_completion() {
        let mut e = entity(1.0, 0.5, 0.5);
        let mut monitor = ComplianceMonitor::new();
        e.assign_task(Task::from("scan")).unwrap();

        let outcome = e
            .execute_next_task(&EntityConfig::default(), &mut monitor)
            .unwrap();

        // cost = 0.1 * (1 - 0.5) = 0.05
        assert!((e.energy().value() - 0.95).abs() < EPS);
        assert_eq!(e.completed_count(), 1);
        assert_eq!(e.tasks().len(), 0);
        assert!(matches!(outcome, Execution::Completed { rested: false, .. }));
        let records = monitor.records_for(e.id());
        assert_eq!(records.len(), 1);
        assert_eq!(records.first().map(|r| r.status), Some(ComplianceStatus::Completed));
    }

    #[test]
    fn execute_to_threshold_moves_to_resting() {
        let mut e = entity(0.35, 0.0, 0.5);
        let mut monitor = ComplianceMonitor::new();
        e.assign_task(Task::from("scan")).unwrap();

        let outcome = e
            .execute_next_task(&EntityConfig::default(), &mut monitor)
            .unwrap();

        assert!(matches!(outcome, Execution::Completed { rested: true, .. }));
        assert_eq!(e.status(), EntityStatus::Resting);
        assert!(monitor.verdict().compliant);
    }

    #[test]
    fn insufficient_energy_keeps_task_queued() {
        let mut e = entity(0.05, 0.0, 0.5);
        let mut monitor = ComplianceMonitor::new();
        e.assign_task(Task::from("t0")).unwrap();
        e.assign_task(Task::from("t1")).unwrap();

        let outcome = e
            .execute_next_task(&EntityConfig::default(), &mut monitor)
            .unwrap();

        assert!(matches!(outcome, Execution::Refused { .. }));
        assert_eq!(e.next_task(), Some(&Task::from("t0")));
        assert_eq!(e.tasks().len(), 2);
        assert!((e.energy().value() - 0.05).abs() < EPS);
        assert_eq!(e.status(), EntityStatus::Resting);
        assert_eq!(e.completed_count(), 0);

        let verdict = monitor.verdict();
        assert!(!verdict.compliant);
        assert_eq!(
            verdict.violations.first().and_then(|v| v.error.as_deref()),
            Some(INSUFFICIENT_ENERGY)
        );
    }

    #[test]
    fn depleted_entity_refuses_even_free_tasks() {
        let mut e = entity(0.0, 1.0, 0.5);
        let mut monitor = ComplianceMonitor::new();
        e.assign_task(Task::from("t0")).unwrap();

        let outcome = e
            .execute_next_task(&EntityConfig::default(), &mut monitor)
            .unwrap();

        assert!(matches!(outcome, Execution::Refused { .. }));
        assert_eq!(e.status(), EntityStatus::Resting);
    }

    #[test]
    fn inactive_entity_cannot_execute() {
        let mut e = entity(1.0, 0.5, 0.5);
        e.assign_task(Task::from("t0")).unwrap();
        e.set_status(EntityStatus::Inactive);
        let mut monitor = ComplianceMonitor::new();
        assert!(
            e.execute_next_task(&EntityConfig::default(), &mut monitor)
                .is_err()
        );
    }

    #[test]
    fn receive_energy_rejects_negative() {
        let mut e = entity(0.5, 0.5, 0.5);
        assert!(matches!(
            e.receive_energy(-0.1),
            Err(EntityError::InvalidArgument { .. })
        ));
        assert!(e.receive_energy(f64::NAN).is_err());
        assert!((e.energy().value() - 0.5).abs() < EPS);
    }

    #[test]
    fn receive_energy_is_idempotent_at_full() {
        let mut e = entity(1.0, 0.5, 0.5);
        for _ in 0..5 {
            let level = e.receive_energy(0.4).unwrap();
            assert!((level.value() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn receive_energy_does_not_change_status() {
        let mut e = entity(0.1, 0.5, 0.5);
        e.set_status(EntityStatus::Resting);
        e.receive_energy(0.8).unwrap();
        assert_eq!(e.status(), EntityStatus::Resting);
    }

    #[test]
    fn self_evolve_applies_when_gate_met() {
        let mut e = entity(0.9, 0.6, 0.8);
        let outcome = e.self_evolve(&EntityConfig::default());
        assert!(matches!(outcome, SelfEvolution::Evolved { .. }));
        assert!((e.energy().value() - 0.81).abs() < EPS);
        assert!((e.chromosome().performance - 0.65).abs() < EPS);
    }

    #[test]
    fn self_evolve_accepts_energy_at_gate() {
        let mut e = entity(0.8, 0.6, 0.8);
        assert!(matches!(
            e.self_evolve(&EntityConfig::default()),
            SelfEvolution::Evolved { .. }
        ));
    }

    #[test]
    fn self_evolve_requires_potential_above_gate() {
        let mut e = entity(1.0, 0.6, 0.7);
        assert_eq!(
            e.self_evolve(&EntityConfig::default()),
            SelfEvolution::ConditionsNotMet
        );
        assert!((e.energy().value() - 1.0).abs() < EPS);
    }

    #[test]
    fn self_evolve_caps_performance() {
        let mut e = entity(1.0, 0.99, 0.9);
        e.self_evolve(&EntityConfig::default());
        assert!((e.chromosome().performance - 1.0).abs() < EPS);
    }

    #[test]
    fn record_roundtrip_preserves_queue() {
        let mut e = entity(0.7, 0.5, 0.5);
        e.assign_task(Task::from("t0")).unwrap();
        e.assign_task(Task::from("t1")).unwrap();
        let restored = Entity::from_record(e.to_record()).unwrap();
        assert_eq!(restored, e);
    }

    #[test]
    fn record_with_bad_gene_is_rejected() {
        let mut record = entity(0.7, 0.5, 0.5).to_record();
        record.chromosome.learning = 2.0;
        assert!(Entity::from_record(record).is_err());
    }
}

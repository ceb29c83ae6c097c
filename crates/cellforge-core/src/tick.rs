//! Tick cycle: one fully serialized generational step of the population.
//!
//! Each tick runs these phases in order:
//!
//! 1. **Spawn** -- `spawn_per_tick` new children, plus one when the
//!    environment reading calls for cooling.
//! 2. **Distribute** -- hand the task pool to active entities in id order.
//!    Refused assignments become `failed` compliance records.
//! 3. **Execute** -- every active entity runs its head task. Refusals are
//!    logged as `pending` by the entity itself.
//! 4. **Share** -- low-energy entities draw from the richest donors.
//! 5. **Evolve** -- entities attempt self-evolution; the root tries with
//!    probability `evolution_chance`.
//! 6. **Cull** -- evaluate and drop entities below mean fitness.
//! 7. **Signal** -- broadcast chromosomes through the [`SignalBridge`].
//! 8. **Regenerate** -- one regeneration roll.
//! 9. **Persist** -- every `persist_every` ticks.
//! 10. **Reflect** -- registered [`Capability`] observers see the report.
//!
//! Given the same seed, bridge, and readings, two runs produce the same
//! sequence of reports apart from timestamps and generated ids.

use serde::Serialize;
use tracing::{debug, info, warn};

use cellforge_entities::{DistributionReport, Execution};
use cellforge_types::{EntityId, EntityStatus, Task};

use crate::bridge::{OfflineBridge, SignalBridge, SignalSummary};
use crate::capability::Capability;
use crate::config::SimulationConfig;
use crate::environment::{Directive, EnvironmentReading};
use crate::error::PopulationError;
use crate::population::{CullReport, EnergyTransfer, PopulationManager, RootEvolution};
use crate::regeneration::{RegenerationError, RegenerationEvent, RegenerationService};

/// Errors that can occur during tick setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A population operation failed.
    #[error("population error: {source}")]
    Population {
        /// The underlying population error.
        #[from]
        source: PopulationError,
    },

    /// The regeneration service could not be built.
    #[error("regeneration error: {source}")]
    Regeneration {
        /// The underlying regeneration error.
        #[from]
        source: RegenerationError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The tick number that was executed.
    pub tick: u64,
    /// Directives derived from the environment reading, if one was given.
    pub directives: Vec<Directive>,
    /// Entities created this tick.
    pub spawned: Vec<EntityId>,
    /// Task assignments and refusals.
    pub distribution: DistributionReport,
    /// Entities that completed a task.
    pub completed: Vec<EntityId>,
    /// Entities that refused a task for lack of energy.
    pub refused: Vec<EntityId>,
    /// Energy moved between entities.
    pub transfers: Vec<EnergyTransfer>,
    /// Entities that evolved.
    pub evolved: Vec<EntityId>,
    /// Root evolution outcome, when the roll allowed an attempt.
    pub root_evolution: Option<RootEvolution>,
    /// Evaluation outcome, absent when the population was empty.
    pub cull: Option<CullReport>,
    /// Signal broadcast counts.
    pub signals: SignalSummary,
    /// The regeneration attempt.
    pub regeneration: Option<RegenerationEvent>,
    /// Whether the state was written to disk this tick.
    pub persisted: bool,
    /// Number of live entities at end of tick.
    pub population: usize,
}

impl TickReport {
    /// A report for `tick` with nothing in it.
    pub fn empty(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }
}

/// Compact, serializable view of a [`TickReport`] for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickCounts {
    /// Tick number.
    pub tick: u64,
    /// Entities created.
    pub spawned: usize,
    /// Tasks assigned.
    pub assigned: usize,
    /// Tasks completed.
    pub completed: usize,
    /// Tasks refused.
    pub refused: usize,
    /// Entities culled.
    pub culled: usize,
    /// Live entities at end of tick.
    pub population: usize,
}

impl From<&TickReport> for TickCounts {
    fn from(report: &TickReport) -> Self {
        Self {
            tick: report.tick,
            spawned: report.spawned.len(),
            assigned: report.distribution.assignments.len(),
            completed: report.completed.len(),
            refused: report.refused.len(),
            culled: report.cull.as_ref().map_or(0, |c| c.culled.len()),
            population: report.population,
        }
    }
}

/// The mutable state passed through the tick cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// Root cell, entities, and compliance log.
    pub population: PopulationManager,
    /// Regeneration roller.
    pub regeneration: RegenerationService,
    /// Outbound signal channel.
    pub bridge: Box<dyn SignalBridge>,
    /// Post-tick observers, notified in registration order.
    pub capabilities: Vec<Box<dyn Capability>>,
    /// Tasks handed out every tick.
    pub task_pool: Vec<Task>,
    /// Children spawned every tick.
    pub spawn_per_tick: u32,
    /// Persist every this many ticks. `0` disables periodic persistence.
    pub persist_every: u64,
    /// Last completed tick.
    pub tick: u64,
}

impl SimulationState {
    /// Wrap `population` with the tick settings from `config`.
    ///
    /// The tick counter resumes from the one stored in `population`, so a
    /// restored run keeps its numbering and persistence schedule.
    ///
    /// The bridge starts offline and no capabilities are registered. The
    /// regeneration RNG is seeded one past `world.seed` so it does not
    /// mirror the population's draws.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Regeneration`] if the configured rate is invalid.
    pub fn new(config: &SimulationConfig, population: PopulationManager) -> Result<Self, TickError> {
        let seed = config.world.seed.map(|s| s.wrapping_add(1));
        let regeneration = RegenerationService::from_config(&config.regeneration, seed)?;
        let population_tick = population.tick();
        Ok(Self {
            population,
            regeneration,
            bridge: Box::new(OfflineBridge),
            capabilities: Vec::new(),
            task_pool: config
                .population
                .task_pool
                .iter()
                .map(|name| Task::new(name.as_str()))
                .collect(),
            spawn_per_tick: config.population.spawn_per_tick,
            persist_every: config.population.persist_every,
            tick: population_tick,
        })
    }

    /// Register a post-tick observer.
    pub fn register(&mut self, capability: Box<dyn Capability>) {
        info!(capability = capability.name(), "Capability registered");
        self.capabilities.push(capability);
    }
}

/// Execute one complete tick.
///
/// `reading` is the environment sample for this tick, if any.
///
/// # Errors
///
/// Returns [`TickError::Population`] if a population invariant is broken
/// mid-tick. Empty task pools, empty populations, bridge outages, and
/// persistence failures are not errors.
pub fn run_tick(
    state: &mut SimulationState,
    reading: Option<&EnvironmentReading>,
) -> Result<TickReport, TickError> {
    let tick = state.tick.saturating_add(1);
    let mut report = TickReport::empty(tick);
    info!(tick, population = state.population.len(), "Tick started");

    // --- Phase 1: Spawn ---
    report.directives = reading.map(EnvironmentReading::analyze).unwrap_or_default();
    let extra = u32::from(report.directives.contains(&Directive::Cool));
    for _ in 0..state.spawn_per_tick.saturating_add(extra) {
        let id = state.population.spawn_child().id().clone();
        report.spawned.push(id);
    }

    // --- Phase 2: Distribute ---
    if state.task_pool.is_empty() {
        debug!(tick, "Task pool empty, distribution skipped");
    } else {
        report.distribution = state.population.distribute_to_active(&state.task_pool)?;
        for failure in &report.distribution.failures {
            state.population.record_failure(
                &failure.entity_id,
                &failure.task,
                failure.error.to_string(),
            );
        }
    }

    // --- Phase 3: Execute ---
    for id in state.population.ids_with_status(EntityStatus::Active) {
        match state.population.execute_next_task(&id)? {
            Execution::Completed { .. } => report.completed.push(id),
            Execution::Refused { .. } => report.refused.push(id),
            Execution::NoTaskAvailable => {}
        }
    }

    // --- Phase 4: Share ---
    report.transfers = state.population.balance_energy();

    // --- Phase 5: Evolve ---
    report.evolved = state.population.evolve_entities();
    report.root_evolution = state.population.maybe_self_evolve();

    // --- Phase 6: Cull ---
    if state.population.is_empty() {
        debug!(tick, "Population empty, evaluation skipped");
    } else {
        report.cull = Some(state.population.evaluate_and_cull()?);
    }

    // --- Phase 7: Signal ---
    report.signals = state.population.broadcast(state.bridge.as_mut());

    // --- Phase 8: Regenerate ---
    report.regeneration = Some(state.regeneration.attempt(&mut state.population));

    state.population.tick = tick;

    // --- Phase 9: Persist ---
    if tick.checked_rem(state.persist_every) == Some(0) {
        report.persisted = match state.population.persist() {
            Ok(written) => written,
            Err(e) => {
                warn!(tick, error = %e, "Periodic persistence failed");
                false
            }
        };
    }

    report.population = state.population.len();
    state.tick = tick;

    // --- Phase 10: Reflect ---
    for capability in &mut state.capabilities {
        capability.on_tick(&report);
    }

    let counts = TickCounts::from(&report);
    info!(
        tick,
        spawned = counts.spawned,
        assigned = counts.assigned,
        completed = counts.completed,
        refused = counts.refused,
        culled = counts.culled,
        population = counts.population,
        "Tick completed"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::bridge::LoopbackBridge;
    use crate::capability::SelfAwareness;
    use crate::environment::LightLevel;

    fn config(seed: u64) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world.seed = Some(seed);
        config.storage.state_path = None;
        config.regeneration.rate = 0.0;
        config
    }

    fn state(config: &SimulationConfig) -> SimulationState {
        let population = PopulationManager::with_rng(config, StdRng::seed_from_u64(11));
        SimulationState::new(config, population).unwrap()
    }

    #[test]
    fn first_tick_spawns_distributes_and_evaluates() {
        let config = config(1);
        let mut state = state(&config);
        let report = run_tick(&mut state, None).unwrap();

        assert_eq!(report.tick, 1);
        assert_eq!(state.tick, 1);
        assert_eq!(report.spawned.len(), 1);
        assert_eq!(report.distribution.assignments.len(), 1);
        assert_eq!(report.completed.len() + report.refused.len(), 1);
        let cull = report.cull.unwrap();
        assert_eq!(cull.generation, 1);
        assert_eq!(report.population, state.population.len());
        assert!(!report.persisted);
    }

    #[test]
    fn cool_directive_spawns_an_extra_child() {
        let config = config(2);
        let mut state = state(&config);
        let hot = EnvironmentReading {
            temperature: 34.0,
            light: LightLevel::Medium,
            humidity: 50.0,
        };
        let report = run_tick(&mut state, Some(&hot)).unwrap();
        assert_eq!(report.directives, vec![Directive::Cool]);
        assert_eq!(report.spawned.len(), 2);
    }

    #[test]
    fn empty_pool_and_population_do_not_fail() {
        let mut config = config(3);
        config.population.spawn_per_tick = 0;
        config.population.task_pool.clear();
        let mut state = state(&config);

        let report = run_tick(&mut state, None).unwrap();
        assert!(report.distribution.assignments.is_empty());
        assert!(report.cull.is_none());
        assert_eq!(report.population, 0);
        assert_eq!(state.population.generation(), 0);
    }

    #[test]
    fn loopback_bridge_acknowledges_every_entity() {
        let config = config(4);
        let mut state = state(&config);
        let mut bridge = LoopbackBridge::new();
        bridge.connect();
        state.bridge = Box::new(bridge);

        let report = run_tick(&mut state, None).unwrap();
        assert_eq!(report.signals.sent, state.population.len());
        assert_eq!(report.signals.acknowledged, report.signals.sent);
        assert_eq!(report.signals.unavailable, 0);
    }

    #[test]
    fn offline_bridge_is_not_fatal() {
        let config = config(5);
        let mut state = state(&config);
        let report = run_tick(&mut state, None).unwrap();
        assert_eq!(report.signals.acknowledged, 0);
        assert_eq!(report.signals.unavailable, report.signals.sent);
    }

    #[test]
    fn capabilities_see_every_tick() {
        #[derive(Debug, Default)]
        struct Counter(Vec<u64>);
        impl Capability for Counter {
            fn name(&self) -> &'static str {
                "counter"
            }
            fn on_tick(&mut self, report: &TickReport) {
                self.0.push(report.tick);
            }
        }

        let config = config(6);
        let mut state = state(&config);
        state.register(Box::new(SelfAwareness::new()));
        state.register(Box::new(Counter::default()));
        for _ in 0..3 {
            run_tick(&mut state, None).unwrap();
        }
        assert_eq!(state.tick, 3);
        assert_eq!(state.capabilities.len(), 2);
        assert_eq!(state.capabilities[1].name(), "counter");
    }

    #[test]
    fn periodic_persistence_writes_on_schedule() {
        let path = std::env::temp_dir().join(format!(
            "cellforge-tick-{}-{}.json",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let mut config = config(7);
        config.population.persist_every = 2;
        config.storage.state_path = Some(path.clone());
        let mut state = state(&config);

        assert!(!run_tick(&mut state, None).unwrap().persisted);
        assert!(run_tick(&mut state, None).unwrap().persisted);
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_state_path_reports_not_persisted() {
        let mut config = config(8);
        config.population.persist_every = 1;
        config.storage.state_path = Some(
            std::env::temp_dir()
                .join("cellforge-no-such-dir")
                .join("nested")
                .join("state.json"),
        );
        let mut state = state(&config);
        let report = run_tick(&mut state, None).unwrap();
        assert!(!report.persisted);
    }

    #[test]
    fn new_state_resumes_from_population_tick() {
        let config = config(10);
        let mut population = PopulationManager::with_rng(&config, StdRng::seed_from_u64(11));
        population.tick = 7;
        let mut state = SimulationState::new(&config, population).unwrap();
        assert_eq!(state.tick, 7);

        let report = run_tick(&mut state, None).unwrap();
        assert_eq!(report.tick, 8);
        assert_eq!(state.population.tick(), 8);
        assert_eq!(state.population.to_document().tick, 8);
    }

    #[test]
    fn tick_counts_summarize_report() {
        let config = config(9);
        let mut state = state(&config);
        let report = run_tick(&mut state, None).unwrap();
        let counts = TickCounts::from(&report);
        assert_eq!(counts.tick, 1);
        assert_eq!(counts.spawned, report.spawned.len());
        assert_eq!(counts.population, report.population);
    }
}

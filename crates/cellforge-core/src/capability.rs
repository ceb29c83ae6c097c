//! Optional extensions notified after every tick.
//!
//! A [`Capability`] observes the finished [`TickReport`] and keeps whatever
//! state it needs. Capabilities never mutate the population.

use tracing::{info, warn};

use cellforge_types::{EntityId, Task};

use crate::tick::TickReport;

/// A post-tick observer registered on the simulation state.
pub trait Capability: std::fmt::Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Called once per tick with the finished report.
    fn on_tick(&mut self, report: &TickReport);
}

/// Tracks how long the population has been observed and how large it got.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfAwareness {
    ticks_observed: u64,
    peak_population: usize,
    last_population: usize,
}

impl SelfAwareness {
    /// A fresh observer.
    pub const fn new() -> Self {
        Self {
            ticks_observed: 0,
            peak_population: 0,
            last_population: 0,
        }
    }

    /// Ticks seen so far.
    pub const fn ticks_observed(&self) -> u64 {
        self.ticks_observed
    }

    /// Largest end-of-tick population seen.
    pub const fn peak_population(&self) -> usize {
        self.peak_population
    }

    /// End-of-tick population from the most recent tick.
    pub const fn last_population(&self) -> usize {
        self.last_population
    }

    /// Whether at least one tick has been observed.
    pub const fn is_aware(&self) -> bool {
        self.ticks_observed > 0
    }
}

impl Capability for SelfAwareness {
    fn name(&self) -> &'static str {
        "self_awareness"
    }

    fn on_tick(&mut self, report: &TickReport) {
        if !self.is_aware() {
            info!(tick = report.tick, "Self-awareness achieved");
        }
        self.ticks_observed = self.ticks_observed.saturating_add(1);
        self.last_population = report.population;
        self.peak_population = self.peak_population.max(report.population);
    }
}

/// A task assignment that matched a forbidden keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedTask {
    /// Tick the assignment happened in.
    pub tick: u64,
    /// Receiving entity.
    pub entity_id: EntityId,
    /// The task.
    pub task: Task,
    /// The keyword that matched.
    pub keyword: String,
}

/// Flags assigned tasks whose descriptors contain forbidden keywords.
///
/// Matching is case-insensitive substring search. Flagging is advisory; the
/// task still runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthicalGuard {
    forbidden: Vec<String>,
    flagged: Vec<FlaggedTask>,
}

impl Default for EthicalGuard {
    fn default() -> Self {
        Self::new(["harm", "deceive", "destroy"])
    }
}

impl EthicalGuard {
    /// A guard over the given keywords.
    pub fn new<S: AsRef<str>>(forbidden: impl IntoIterator<Item = S>) -> Self {
        Self {
            forbidden: forbidden
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            flagged: Vec::new(),
        }
    }

    /// The first forbidden keyword contained in `task`, if any.
    pub fn check(&self, task: &Task) -> Option<&str> {
        let name = task.name().to_lowercase();
        self.forbidden
            .iter()
            .find(|k| name.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Every flagged assignment so far.
    pub fn flagged(&self) -> &[FlaggedTask] {
        &self.flagged
    }
}

impl Capability for EthicalGuard {
    fn name(&self) -> &'static str {
        "ethical_guard"
    }

    fn on_tick(&mut self, report: &TickReport) {
        for assignment in &report.distribution.assignments {
            let Some(keyword) = self.check(&assignment.task).map(str::to_owned) else {
                continue;
            };
            warn!(
                tick = report.tick,
                entity_id = %assignment.entity_id,
                task = %assignment.task,
                %keyword,
                "Task flagged by ethical guard"
            );
            self.flagged.push(FlaggedTask {
                tick: report.tick,
                entity_id: assignment.entity_id.clone(),
                task: assignment.task.clone(),
                keyword,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use cellforge_entities::{Assignment, DistributionReport};

    use super::*;

    fn report(tick: u64, population: usize, tasks: &[&str]) -> TickReport {
        TickReport {
            tick,
            population,
            distribution: DistributionReport {
                assignments: tasks
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Assignment {
                        entity_id: EntityId::from(format!("e{i}")),
                        task: Task::from(*t),
                        queue_len: 1,
                    })
                    .collect(),
                failures: Vec::new(),
            },
            ..TickReport::empty(tick)
        }
    }

    #[test]
    fn self_awareness_tracks_peak() {
        let mut awareness = SelfAwareness::new();
        assert!(!awareness.is_aware());
        awareness.on_tick(&report(1, 4, &[]));
        awareness.on_tick(&report(2, 9, &[]));
        awareness.on_tick(&report(3, 2, &[]));
        assert!(awareness.is_aware());
        assert_eq!(awareness.ticks_observed(), 3);
        assert_eq!(awareness.peak_population(), 9);
        assert_eq!(awareness.last_population(), 2);
    }

    #[test]
    fn guard_flags_forbidden_tasks_case_insensitively() {
        let mut guard = EthicalGuard::default();
        guard.on_tick(&report(7, 3, &["scan", "HARM neighbour", "store"]));
        assert_eq!(guard.flagged().len(), 1);
        let flagged = guard.flagged().first().cloned();
        assert_eq!(flagged.as_ref().map(|f| f.tick), Some(7));
        assert_eq!(
            flagged.map(|f| f.entity_id),
            Some(EntityId::from("e1"))
        );
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let guard = EthicalGuard::new(["Exploit"]);
        assert_eq!(guard.check(&Task::from("exploit-gap")), Some("exploit"));
        assert!(guard.check(&Task::from("harm")).is_none());
    }
}

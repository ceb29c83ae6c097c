//! Cyclic round-robin task assignment.
//!
//! Entity `i` receives `tasks[i % tasks.len()]`. Assignment failures are
//! collected per entity; one inactive entity never blocks the rest of the
//! batch.

use serde::Serialize;
use tracing::{debug, warn};

use cellforge_types::{EntityId, Task};

use crate::entity::Entity;
use crate::error::EntityError;

/// A task that landed on an entity's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Receiving entity.
    pub entity_id: EntityId,
    /// Task assigned.
    pub task: Task,
    /// Queue length after the assignment.
    pub queue_len: usize,
}

/// A task an entity refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentFailure {
    /// Entity that refused.
    pub entity_id: EntityId,
    /// Task that was offered.
    pub task: Task,
    /// Why it was refused.
    pub error: EntityError,
}

/// Outcome of one [`distribute`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionReport {
    /// Successful assignments, in entity order.
    pub assignments: Vec<Assignment>,
    /// Refused assignments, in entity order.
    pub failures: Vec<AssignmentFailure>,
}

/// Hand `tasks` out to `entities` in cyclic order.
///
/// # Errors
///
/// Returns [`EntityError::EmptyTaskList`] if `tasks` is empty. Per-entity
/// refusals are reported in [`DistributionReport::failures`] instead.
pub fn distribute<'a>(
    entities: impl IntoIterator<Item = &'a mut Entity>,
    tasks: &[Task],
) -> Result<DistributionReport, EntityError> {
    if tasks.is_empty() {
        return Err(EntityError::EmptyTaskList);
    }

    let mut report = DistributionReport::default();
    for (entity, task) in entities.into_iter().zip(tasks.iter().cycle()) {
        match entity.assign_task(task.clone()) {
            Ok(queue_len) => report.assignments.push(Assignment {
                entity_id: entity.id().clone(),
                task: task.clone(),
                queue_len,
            }),
            Err(error) => {
                warn!(entity_id = %entity.id(), %task, %error, "Task assignment refused");
                report.failures.push(AssignmentFailure {
                    entity_id: entity.id().clone(),
                    task: task.clone(),
                    error,
                });
            }
        }
    }

    debug!(
        assigned = report.assignments.len(),
        refused = report.failures.len(),
        "Tasks distributed"
    );
    Ok(report)
}

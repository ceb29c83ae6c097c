//! Error types for the cellforge-entities crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! Recoverable conditions (empty queue, low energy, ineligible transfers)
//! are reported through result enums instead and never appear here.

use cellforge_types::{EntityId, EntityStatus};

/// Errors that can occur during entity operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// The operation is not allowed in the entity's current status.
    #[error("entity {entity_id} is {status} and cannot {operation}")]
    InvalidState {
        /// The entity the operation targeted.
        entity_id: EntityId,
        /// The status that blocked the operation.
        status: EntityStatus,
        /// What was attempted.
        operation: &'static str,
    },

    /// An input was negative, non-finite, or otherwise out of range.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the rejected input.
        reason: String,
    },

    /// Task distribution was asked to hand out an empty task list.
    #[error("task list is empty")]
    EmptyTaskList,
}

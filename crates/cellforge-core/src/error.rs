//! Error types for population management and persistence.

use std::path::PathBuf;

use cellforge_entities::EntityError;
use cellforge_types::EntityId;

/// Errors raised by the [`PopulationManager`](crate::PopulationManager).
#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    /// An evaluation cycle was requested with no entities to evaluate.
    #[error("population is empty")]
    EmptyPopulation,

    /// The state document to restore from does not exist.
    #[error("state document not found: {}", path.display())]
    NotFound {
        /// Where the document was expected.
        path: PathBuf,
    },

    /// The state document exists but cannot be used.
    #[error("malformed state document {}: {reason}", path.display())]
    MalformedState {
        /// The offending document.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// A new entity named a parent that is neither the root nor a live entity.
    #[error("unknown parent {parent_id}")]
    UnknownParent {
        /// The requested parent id.
        parent_id: EntityId,
    },

    /// An operation targeted an id with no live entity.
    #[error("unknown entity {entity_id}")]
    UnknownEntity {
        /// The requested id.
        entity_id: EntityId,
    },

    /// Reading or writing the state document failed.
    #[error("state I/O error at {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An entity operation failed.
    #[error("entity error: {source}")]
    Entity {
        /// The underlying entity error.
        #[from]
        source: EntityError,
    },
}

//! The persisted population document.
//!
//! Layout (JSON):
//!
//! ```text
//! {
//!   "version": 1,
//!   "root": { id, energy, damage, repair_state, chromosome },
//!   "generation": 3,
//!   "entities": [ { id, parent_id, generation, status, energy, tasks,
//!                   chromosome, completed_count, created_at } ],
//!   "evolution_score": 0.55,
//!   "evolution_history": [ { timestamp, score } ],
//!   "compliance": { "<entity id>": [ { sequence, task, status,
//!                                      timestamp, error_message? } ] }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EntityStatus, RepairState};
use crate::ids::EntityId;
use crate::structs::{Chromosome, ComplianceRecord, Energy, EvolutionRecord, Task};

/// Document version written by this build.
pub const CURRENT_DOCUMENT_VERSION: u32 = 1;

const fn default_version() -> u32 {
    CURRENT_DOCUMENT_VERSION
}

/// Persisted form of the root cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootRecord {
    /// Root id; every first-generation entity points at it.
    pub id: EntityId,
    /// Root energy.
    pub energy: Energy,
    /// Accumulated damage in `[0.0, 1.0]`.
    pub damage: f64,
    /// Whether a repair is pending.
    #[serde(default)]
    pub repair_state: RepairState,
    /// Root trait vector.
    pub chromosome: Chromosome,
}

/// Persisted form of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity id.
    pub id: EntityId,
    /// Id of the creating entity (informational; may dangle after culling).
    pub parent_id: EntityId,
    /// Depth below the root (1 for children of the root).
    pub generation: u32,
    /// Lifecycle status.
    pub status: EntityStatus,
    /// Current energy.
    pub energy: Energy,
    /// Queued tasks, head first.
    pub tasks: Vec<Task>,
    /// Trait vector.
    pub chromosome: Chromosome,
    /// Number of tasks executed to completion.
    pub completed_count: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Full population state as written by `persist` and read by `restore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationDocument {
    /// Layout version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// The root cell.
    pub root: RootRecord,
    /// Number of completed evaluation cycles.
    #[serde(default)]
    pub generation: u64,
    /// Last completed tick of the cycle that wrote the document.
    #[serde(default)]
    pub tick: u64,
    /// Every live entity.
    pub entities: Vec<EntityRecord>,
    /// Root-level evolution aggregate.
    pub evolution_score: f64,
    /// Successful root evolutions in order.
    #[serde(default)]
    pub evolution_history: Vec<EvolutionRecord>,
    /// Compliance records keyed by entity id.
    #[serde(default)]
    pub compliance: BTreeMap<EntityId, Vec<ComplianceRecord>>,
}

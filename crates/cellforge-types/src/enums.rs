//! Enumeration types for the population model.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entity lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of an entity.
///
/// Transitions:
/// - `Active -> Resting` when energy drops to the rest threshold.
/// - `Resting -> Active` only when caller logic applies it explicitly.
/// - `Active | Resting -> Inactive` on explicit deactivation.
/// - `Inactive -> Active` only through the population manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    /// Accepting and executing tasks.
    Active,
    /// Low on energy; keeps its queue but is skipped by the tick.
    Resting,
    /// Deactivated; refuses new tasks.
    Inactive,
}

impl EntityStatus {
    /// Returns `true` if the status accepts new tasks.
    pub const fn accepts_tasks(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

impl core::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Resting => "resting",
            Self::Inactive => "inactive",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Chromosome traits
// ---------------------------------------------------------------------------

/// A named trait on a [`Chromosome`](crate::Chromosome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gene {
    /// Reduces the energy cost of executing a task.
    Performance,
    /// Gates self-evolution.
    EvolutionPotential,
    /// Scales fitness during generational evaluation.
    Learning,
    /// Scales the starting energy of a new child.
    EnergyEfficiency,
    /// Carried for collaborators; no core behavior branches on it.
    DecisionSpeed,
}

impl Gene {
    /// Every gene, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Performance,
        Self::EvolutionPotential,
        Self::Learning,
        Self::EnergyEfficiency,
        Self::DecisionSpeed,
    ];
}

// ---------------------------------------------------------------------------
// Compliance
// ---------------------------------------------------------------------------

/// Outcome of a task as recorded in the compliance log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// The task ran to completion.
    Completed,
    /// The task is still queued (e.g. refused for lack of energy).
    Pending,
    /// The task could not be assigned or executed.
    Failed,
}

// ---------------------------------------------------------------------------
// Root repair
// ---------------------------------------------------------------------------

/// Repair state of the root cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairState {
    /// No repair in progress.
    #[default]
    Idle,
    /// Damage is present and a repair has been requested.
    Repairing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_refuses_tasks() {
        assert!(EntityStatus::Active.accepts_tasks());
        assert!(EntityStatus::Resting.accepts_tasks());
        assert!(!EntityStatus::Inactive.accepts_tasks());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&EntityStatus::Resting).ok();
        assert_eq!(json.as_deref(), Some("\"resting\""));
        let json = serde_json::to_string(&ComplianceStatus::Completed).ok();
        assert_eq!(json.as_deref(), Some("\"completed\""));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let parsed: Result<EntityStatus, _> = serde_json::from_str("\"sleeping\"");
        assert!(parsed.is_err());
    }
}

//! Identifier type for population members.
//!
//! Entity ids are plain strings so they survive the persisted document
//! unchanged and stay readable in logs (`CHILD-0192...`). Generated ids
//! embed a UUID v7, which is time-ordered and unique within a run; tests
//! and restored documents may use any string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix for entities spawned directly by the root.
const CHILD_PREFIX: &str = "CHILD";

/// Prefix for entities spawned by another entity.
const GRANDCHILD_PREFIX: &str = "GRANDCHILD";

/// Unique identifier for the root or any entity in the population.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a fresh id for an entity whose parent is the root.
    pub fn child() -> Self {
        Self::generated(CHILD_PREFIX)
    }

    /// Generate a fresh id for an entity whose parent is another entity.
    pub fn grandchild() -> Self {
        Self::generated(GRANDCHILD_PREFIX)
    }

    fn generated(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", Uuid::now_v7().simple()))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Shared type definitions for the Cellforge population engine.
//!
//! This crate is the single source of truth for the data model shared by
//! the entity, compliance, and population crates. It holds no behavior
//! beyond construction, clamping, and validation helpers.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed entity identifiers
//! - [`enums`] -- Status, gene, and compliance enumerations
//! - [`structs`] -- Energy, chromosomes, tasks, and audit/evolution records
//! - [`document`] -- The persisted population document layout

pub mod document;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use document::{
    CURRENT_DOCUMENT_VERSION, EntityRecord, PopulationDocument, RootRecord,
};
pub use enums::{ComplianceStatus, EntityStatus, Gene, RepairState};
pub use ids::EntityId;
pub use structs::{
    Chromosome, ComplianceRecord, Energy, EnergyOutOfRange, EvolutionRecord, Task, clamp_unit,
};

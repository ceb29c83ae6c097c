//! Entity state, behavior, and peer interactions for the Cellforge engine.
//!
//! This crate contains the logic layer for population members -- everything
//! that operates on a single entity (or a pair of entities) without owning
//! the population. It sits between `cellforge-types` (the data model) and
//! `cellforge-core` (the population manager and tick cycle).
//!
//! # Modules
//!
//! - [`config`] -- Tunables for task cost, resting, and self-evolution ([`EntityConfig`])
//! - [`distribution`] -- Cyclic round-robin task assignment ([`distribute`])
//! - [`entity`] -- The [`Entity`] type and its lifecycle operations
//! - [`error`] -- Error types for entity operations ([`EntityError`])
//! - [`exchange`] -- Peer-to-peer energy transfer policy ([`ExchangePolicy`])
//! - [`genome`] -- Seeded chromosome sampling ([`ChromosomeGenerator`])

pub mod config;
pub mod distribution;
pub mod entity;
pub mod error;
pub mod exchange;
pub mod genome;

// Re-export primary types at crate root for convenience.
pub use config::EntityConfig;
pub use distribution::{Assignment, AssignmentFailure, DistributionReport, distribute};
pub use entity::{Entity, Execution, INSUFFICIENT_ENERGY, SelfEvolution};
pub use error::EntityError;
pub use exchange::{ExchangePolicy, IneligibleTransfer, TransferResult};
pub use genome::{ChromosomeGenerator, GeneRange, GeneRanges};

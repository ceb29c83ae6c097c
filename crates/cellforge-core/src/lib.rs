//! Population management and the tick cycle for the Cellforge engine.
//!
//! This crate owns the root cell and its entity population, and the
//! serialized tick that drives them: spawn, distribute, execute, share,
//! evolve, cull, signal, regenerate, persist.
//!
//! # Modules
//!
//! - [`bridge`] -- [`SignalBridge`] trait with offline and loopback
//!   implementations.
//! - [`capability`] -- Post-tick observers ([`SelfAwareness`],
//!   [`EthicalGuard`]).
//! - [`config`] -- Configuration loading from `cellforge-config.yaml` into
//!   strongly-typed structs.
//! - [`environment`] -- Environment readings and the directives they imply.
//! - [`error`] -- [`PopulationError`].
//! - [`persistence`] -- Saving and restoring the population document.
//! - [`population`] -- [`PopulationManager`] and the [`RootCell`].
//! - [`regeneration`] -- Probabilistic root repair and entity revival.
//! - [`tick`] -- The tick cycle.
//!
//! [`SignalBridge`]: bridge::SignalBridge
//! [`SelfAwareness`]: capability::SelfAwareness
//! [`EthicalGuard`]: capability::EthicalGuard
//! [`PopulationError`]: error::PopulationError
//! [`PopulationManager`]: population::PopulationManager
//! [`RootCell`]: population::RootCell

pub mod bridge;
pub mod capability;
pub mod config;
pub mod environment;
pub mod error;
pub mod persistence;
pub mod population;
pub mod regeneration;
pub mod tick;

pub use config::SimulationConfig;
pub use error::PopulationError;
pub use population::{PopulationManager, RootCell};
pub use tick::{SimulationState, TickError, TickReport, run_tick};

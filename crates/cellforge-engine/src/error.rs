//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup, the tick loop,
//! and shutdown so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cellforge_core::config::ConfigError,
    },

    /// Restoring or persisting the population failed.
    #[error("population error: {source}")]
    Population {
        /// The underlying population error.
        #[from]
        source: cellforge_core::PopulationError,
    },

    /// A tick failed unrecoverably.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: cellforge_core::TickError,
    },

    /// Exporting the compliance report failed.
    #[error("compliance error: {source}")]
    Compliance {
        /// The underlying compliance error.
        #[from]
        source: cellforge_compliance::ComplianceError,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}

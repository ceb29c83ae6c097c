//! Error types for the compliance log.

use std::path::PathBuf;

/// Errors that can occur while exporting or importing the compliance log.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    /// Reading or writing the report file failed.
    #[error("compliance report I/O failed for {path}: {source}")]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The report could not be encoded or decoded.
    #[error("compliance report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An imported record map reuses a sequence number.
    #[error("duplicate compliance sequence number {sequence}")]
    DuplicateSequence {
        /// The repeated sequence number.
        sequence: u64,
    },
}

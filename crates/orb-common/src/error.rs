//! Error types shared across the Orb combat crates.

use thiserror::Error;

use crate::version::SchemaVersion;

/// Top-level error type for harness and loading operations.
///
/// Gameplay failures (failed casts, unknown effects) are not represented
/// here; they are typed outcomes of the engine operations themselves.
#[derive(Debug, Error)]
pub enum OrbError {
    /// Catalog content could not be loaded or failed validation
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads
        expected: SchemaVersion,
        /// Version found in the data
        actual: SchemaVersion,
    },
}

/// Result type alias for Orb operations.
pub type OrbResult<T> = Result<T, OrbError>;

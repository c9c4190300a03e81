//! Error types for the simulator
//!
//! User operations never fail; they degrade to no-ops. Errors only arise
//! while building a simulator from configuration, rosters, and scripts.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::types::{AgentId, AgentName};

/// Top-level simulator error
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Invalid configuration, roster, or script
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Agent logs must keep at least one entry
    #[error("log_capacity must be at least 1")]
    ZeroLogCapacity,

    /// Playback speed must be a finite, non-negative factor
    #[error("time_scale must be finite and non-negative, got {0}")]
    InvalidTimeScale(f64),

    /// No agents at all
    #[error("roster is empty")]
    EmptyRoster,

    /// Two agents share an id
    #[error("duplicate agent id '{0}'")]
    DuplicateAgentId(AgentId),

    /// Two agents play the same role
    #[error("role '{0}' appears more than once")]
    DuplicateAgentName(AgentName),

    /// A step acts on a role nobody in the roster plays
    #[error("step {index} refers to '{agent}', which is not in the roster")]
    UnknownScriptAgent {
        /// Step position
        index: usize,
        /// Role the step names
        agent: AgentName,
    },
}

/// Convenience result alias for configuration checks
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Atomic write failed
    #[error("Atomic write failed for {path}: {detail}")]
    AtomicWriteFailed {
        /// Path where write failed
        path: PathBuf,
        /// Error details
        detail: String,
    },

    /// A file held JSON of the wrong shape
    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        /// File that failed to parse
        path: PathBuf,
        /// Decoder error
        source: serde_json::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type using SimError
pub type Result<T> = std::result::Result<T, SimError>;

// crates/strata-core/src/error.rs

use thiserror::Error;

/// Workspace-wide error types for the strata engine.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Derivation oracle failure. Terminal for the affected item's chain:
    /// the oracle is deterministic, so retrying the same seed cannot help.
    #[error("Derivation error: {0}")]
    Derivation(String),

    /// Ledger client failure that escaped the retry gate.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Storage layer error (checkpoint file, result log, output artifact).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Checkpoint data is present but structurally corrupt. Fatal for the
    /// whole run unless the operator passes an explicit force-restart flag.
    #[error("Checkpoint corruption: {0}")]
    CheckpointCorruption(String),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid state transition or inconsistent engine state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for StrataError {
    fn from(e: std::io::Error) -> Self {
        StrataError::Storage(e.to_string())
    }
}

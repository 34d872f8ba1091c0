// crates/strata-core/src/config.rs
//
// Immutable per-run parameters, constructed once and passed down explicitly.
// Nothing in the engine reads ambient global state.

use std::path::PathBuf;
use std::time::Duration;

/// Per-run configuration for the pipeline engine.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of derivation hops per item.
    pub max_layers: u32,
    /// Number of parallel workers in the pool.
    pub concurrency: usize,
    /// Whether derived identities are verified against the ledger.
    pub rpc_enabled: bool,
    /// Minimum spacing between ledger calls across all workers combined.
    pub min_call_spacing: Duration,
    /// Retry budget for transient ledger failures, per layer.
    pub max_retries: u32,
    /// Base delay for exponential retry backoff (doubles per attempt,
    /// capped at 32x the base).
    pub retry_backoff_base: Duration,
    /// Hard timeout for a single oracle or ledger call.
    pub call_timeout: Duration,
    /// Path of the checkpoint file.
    pub checkpoint_path: PathBuf,
    /// Path of the append-only per-item result log.
    pub results_path: PathBuf,
    /// Commit a checkpoint after every N fully completed items.
    pub save_every_n: u64,
    /// Operator override: discard a structurally corrupt checkpoint instead
    /// of aborting the run.
    pub force_restart: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_layers: 3,
            concurrency: 4,
            rpc_enabled: true,
            min_call_spacing: Duration::from_millis(300),
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            call_timeout: Duration::from_secs(30),
            checkpoint_path: PathBuf::from("strata_checkpoint.json"),
            results_path: PathBuf::from("strata_results.jsonl"),
            save_every_n: 500,
            force_restart: false,
        }
    }
}

impl RunConfig {
    /// Validate field combinations that would make a run nonsensical.
    pub fn validate(&self) -> Result<(), crate::error::StrataError> {
        if self.max_layers == 0 {
            return Err(crate::error::StrataError::Config(
                "max_layers must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(crate::error::StrataError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.save_every_n == 0 {
            return Err(crate::error::StrataError::Config(
                "save_every_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_fields() {
        let mut config = RunConfig::default();
        config.max_layers = 0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.save_every_n = 0;
        assert!(config.validate().is_err());
    }
}

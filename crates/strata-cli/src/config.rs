// crates/strata-cli/src/config.rs
//
// Runtime configuration for the strata CLI. Loaded from a TOML file or
// populated with sensible defaults; CLI flags override file values.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use strata_core::RunConfig;

/// File-level configuration, converted into a [`RunConfig`] for the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    /// Maximum number of derivation hops per item.
    #[serde(default = "default_max_layers")]
    pub max_layers: u32,

    /// Number of parallel workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Whether derived identities are verified against the ledger.
    #[serde(default = "default_rpc_enabled")]
    pub rpc_enabled: bool,

    /// Minimum spacing between ledger calls, in milliseconds.
    #[serde(default = "default_min_call_spacing_ms")]
    pub min_call_spacing_ms: u64,

    /// Retry budget for transient ledger failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Hard timeout for a single oracle or ledger call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Path of the checkpoint file.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,

    /// Path of the append-only result log.
    #[serde(default = "default_results_path")]
    pub results_path: String,

    /// Path of the output artifact.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Commit a checkpoint after every N completed items.
    #[serde(default = "default_save_every_n")]
    pub save_every_n: u64,

    /// Base URL of the ledger's HTTP API.
    #[serde(default = "default_ledger_url")]
    pub ledger_url: String,

    /// Deriver command: program followed by leading arguments; the seed is
    /// appended as the final argument per call.
    #[serde(default)]
    pub oracle_command: Vec<String>,
}

fn default_max_layers() -> u32 {
    3
}

fn default_concurrency() -> usize {
    4
}

fn default_rpc_enabled() -> bool {
    true
}

fn default_min_call_spacing_ms() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_checkpoint_path() -> String {
    "~/.strata/checkpoint.json".to_string()
}

fn default_results_path() -> String {
    "~/.strata/results.jsonl".to_string()
}

fn default_output_path() -> String {
    "~/.strata/artifact.json".to_string()
}

fn default_save_every_n() -> u64 {
    500
}

fn default_ledger_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_layers: default_max_layers(),
            concurrency: default_concurrency(),
            rpc_enabled: default_rpc_enabled(),
            min_call_spacing_ms: default_min_call_spacing_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            call_timeout_secs: default_call_timeout_secs(),
            checkpoint_path: default_checkpoint_path(),
            results_path: default_results_path(),
            output_path: default_output_path(),
            save_every_n: default_save_every_n(),
            ledger_url: default_ledger_url(),
            oracle_command: Vec::new(),
        }
    }
}

impl FileConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: FileConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Convert into the engine's immutable run configuration.
    pub fn to_run_config(&self, force_restart: bool) -> RunConfig {
        RunConfig {
            max_layers: self.max_layers,
            concurrency: self.concurrency,
            rpc_enabled: self.rpc_enabled,
            min_call_spacing: Duration::from_millis(self.min_call_spacing_ms),
            max_retries: self.max_retries,
            retry_backoff_base: Duration::from_millis(self.retry_backoff_ms),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            checkpoint_path: expand_tilde(&self.checkpoint_path),
            results_path: expand_tilde(&self.results_path),
            save_every_n: self.save_every_n,
            force_restart,
        }
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// crates/strata-remote/src/oracle.rs
//
// Subprocess-backed derivation oracle: spawns a configured deriver command
// with the seed as its final argument and reads the identity from stdout.
// Any concrete deriver (native binding, script, container wrapper) plugs in
// behind the `DerivationOracle` trait without touching the pipeline.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use strata_core::{is_valid_identity, is_valid_seed, DerivationOracle, StrataError};

/// Derivation oracle that shells out to an external command.
#[derive(Debug, Clone)]
pub struct SubprocessOracle {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessOracle {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DerivationOracle for SubprocessOracle {
    async fn derive(&self, seed: &str) -> Result<String, StrataError> {
        if !is_valid_seed(seed) {
            return Err(StrataError::Derivation(format!(
                "seed is not {} lowercase letters",
                strata_core::SEED_LEN
            )));
        }

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(&self.args)
                .arg(seed)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            StrataError::Derivation(format!("deriver {} timed out", self.program))
        })?
        .map_err(|e| {
            StrataError::Derivation(format!("failed to spawn deriver {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StrataError::Derivation(format!(
                "deriver exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let identity = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
            .to_string();

        if !is_valid_identity(&identity) {
            return Err(StrataError::Derivation(format!(
                "deriver produced a malformed identity ({} chars)",
                identity.len()
            )));
        }

        tracing::trace!("Derived {}... from seed {}...", &identity[..8], &seed[..8]);
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::SEED_LEN;

    fn seed() -> String {
        "a".repeat(SEED_LEN)
    }

    #[tokio::test]
    async fn test_derives_identity_from_command_output() {
        let identity = "A".repeat(60);
        // `printf '%s\n' <identity>` ignores the trailing seed argument the
        // oracle appends, standing in for a real deriver.
        let oracle = SubprocessOracle::new(
            "sh",
            vec![
                "-c".to_string(),
                format!("printf '%s\\n' {}", identity),
            ],
        );
        assert_eq!(oracle.derive(&seed()).await.unwrap(), identity);
    }

    #[tokio::test]
    async fn test_rejects_invalid_seed_before_spawning() {
        let oracle = SubprocessOracle::new("false", vec![]);
        let err = oracle.derive("too-short").await.unwrap_err();
        assert!(matches!(err, StrataError::Derivation(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_derivation_error() {
        let oracle = SubprocessOracle::new("false", vec![]);
        let err = oracle.derive(&seed()).await.unwrap_err();
        assert!(matches!(err, StrataError::Derivation(_)));
    }

    #[tokio::test]
    async fn test_malformed_output_is_derivation_error() {
        let oracle = SubprocessOracle::new(
            "sh",
            vec!["-c".to_string(), "echo not-an-identity".to_string()],
        );
        let err = oracle.derive(&seed()).await.unwrap_err();
        assert!(matches!(err, StrataError::Derivation(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_derivation_error() {
        let oracle = SubprocessOracle::new("strata-no-such-deriver", vec![]);
        let err = oracle.derive(&seed()).await.unwrap_err();
        assert!(matches!(err, StrataError::Derivation(_)));
    }
}

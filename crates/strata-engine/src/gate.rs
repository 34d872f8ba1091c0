// crates/strata-engine/src/gate.rs
//
// Ledger gate: wraps the ledger client with the shared rate limiter, the
// per-call timeout, and the retry/backoff policy, and classifies outcomes
// into the tri-state on-chain verdict.
//
// The central contract: only an explicit, well-formed "not found" answer
// from the ledger may produce `OnChain::False`. Every other failure mode
// degrades to `OnChain::Unknown` with an error tag.

use std::sync::Arc;
use std::time::Duration;

use strata_core::{ErrorTag, LedgerClient, LedgerError, LedgerResponse, OnChain};

use crate::limiter::RateLimiter;

/// Classified outcome of verifying one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub on_chain: OnChain,
    pub balance: Option<u64>,
    pub error: Option<ErrorTag>,
    /// Number of retries consumed (0 when the first call settled it).
    pub retries: u32,
}

/// Rate-limited, retrying front door to the ledger client.
pub struct LedgerGate {
    client: Arc<dyn LedgerClient>,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    backoff_base: Duration,
    call_timeout: Duration,
}

impl LedgerGate {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        limiter: Arc<RateLimiter>,
        max_retries: u32,
        backoff_base: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            limiter,
            max_retries,
            backoff_base,
            call_timeout,
        }
    }

    /// Verify one identity against the ledger.
    ///
    /// Retries transient failures (rate-limit signals, network errors,
    /// timeouts) up to `max_retries` times with exponential backoff, then
    /// gives up and returns `OnChain::Unknown` with the last error tag.
    pub async fn check(&self, identity: &str) -> Verification {
        let mut last_tag = None;

        for attempt in 0..=self.max_retries {
            self.limiter.acquire().await;

            let outcome = tokio::time::timeout(self.call_timeout, self.client.query(identity)).await;

            match outcome {
                Ok(Ok(LedgerResponse::Found(record))) => {
                    return Verification {
                        on_chain: OnChain::True,
                        balance: Some(record.balance),
                        error: None,
                        retries: attempt,
                    };
                }
                Ok(Ok(LedgerResponse::NotFound)) => {
                    // Definitive terminal answer, never retried.
                    return Verification {
                        on_chain: OnChain::False,
                        balance: None,
                        error: None,
                        retries: attempt,
                    };
                }
                Ok(Err(LedgerError::RateLimited)) => {
                    last_tag = Some(ErrorTag::RateLimited);
                    tracing::debug!(
                        "Ledger rate-limited for {} (attempt {}/{})",
                        identity,
                        attempt + 1,
                        self.max_retries + 1
                    );
                }
                Ok(Err(LedgerError::Network(e))) => {
                    last_tag = Some(ErrorTag::TransientNetwork);
                    tracing::debug!(
                        "Ledger network error for {} (attempt {}/{}): {}",
                        identity,
                        attempt + 1,
                        self.max_retries + 1,
                        e
                    );
                }
                Err(_elapsed) => {
                    // Hung call hit the hard per-call timeout.
                    last_tag = Some(ErrorTag::TransientNetwork);
                    tracing::debug!(
                        "Ledger call timed out for {} (attempt {}/{})",
                        identity,
                        attempt + 1,
                        self.max_retries + 1
                    );
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }

        tracing::warn!(
            "Verification exhausted {} retries for {}; recording unknown",
            self.max_retries,
            identity
        );
        Verification {
            on_chain: OnChain::Unknown,
            balance: None,
            error: last_tag,
            retries: self.max_retries,
        }
    }

    /// Exponential backoff: base, doubling per attempt, capped at 32x base.
    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * (1u32 << attempt.min(5))
    }
}

// crates/strata-core/src/traits.rs
//
// Trait interfaces for the engine's external collaborators. The engine only
// ever talks to these; concrete implementations (subprocess deriver, HTTP
// ledger, file seed source, test mocks) live in downstream crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StrataError;

/// Ledger record for an identity the ledger knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub balance: u64,
    pub valid_for_tick: Option<u64>,
    pub incoming_transfers: u32,
    pub outgoing_transfers: u32,
}

/// Well-formed answer from the ledger.
///
/// `NotFound` is a definitive negative: it is the only response that may
/// ever produce `OnChain::False` downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerResponse {
    Found(LedgerRecord),
    NotFound,
}

/// Failure modes of a single ledger call, classified for the retry gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Explicit "too many requests" signal.
    #[error("rate limited")]
    RateLimited,

    /// Network or protocol failure; indistinguishable from a slow ledger.
    #[error("network error: {0}")]
    Network(String),
}

/// Trait for the derivation oracle: seed -> identity.
///
/// Assumed deterministic and side-effect-free from the engine's perspective,
/// which is why any failure is terminal for the item's remaining layers.
#[async_trait]
pub trait DerivationOracle: Send + Sync {
    /// Derive the identity for a seed (55 lowercase letters in,
    /// 60 uppercase alphanumerics out).
    async fn derive(&self, seed: &str) -> Result<String, StrataError>;
}

/// Trait for the ledger client, subject to rate limits.
///
/// Callers must go through the engine's shared rate-limiter gate; the client
/// itself performs no pacing or retries.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Query the ledger for an identity.
    async fn query(&self, identity: &str) -> Result<LedgerResponse, LedgerError>;
}

/// Trait for the seed source: a finite, ordered sequence of input ids.
pub trait SeedSource {
    /// Load the full input sequence. The engine does not care about the
    /// underlying storage format beyond "iterable of ids".
    fn load(&self) -> Result<Vec<String>, StrataError>;
}

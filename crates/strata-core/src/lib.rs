// crates/strata-core/src/lib.rs
//
// strata-core: Core types, traits, and the shared seed transform for the
// strata checkpointed derivation & verification engine.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the canonical data structures, error type, collaborator trait
// interfaces, and the seed-from-identity transform used throughout strata.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod item;
pub mod seed;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use strata_core::WorkItem;`

// Work item types
pub use item::{CompletedItem, ErrorTag, ItemState, LayerResult, OnChain, WorkItem};

// Checkpoint types
pub use checkpoint::{Checkpoint, LayerCounters, RunCounters};

// Run configuration
pub use config::RunConfig;

// Error type
pub use error::StrataError;

// Seed transform
pub use seed::{is_valid_identity, is_valid_seed, seed_from_identity, IDENTITY_LEN, SEED_LEN};

// Traits and collaborator types
pub use traits::{DerivationOracle, LedgerClient, LedgerError, LedgerRecord, LedgerResponse, SeedSource};

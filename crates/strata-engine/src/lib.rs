// crates/strata-engine/src/lib.rs
//
// strata-engine: the checkpointed multi-layer derivation & verification
// pipeline.
//
// A bounded worker pool drives each input seed through its layer chain,
// calling the derivation oracle and (optionally) the ledger client through
// one shared rate limiter, and hands finished items to a dedicated writer
// task that owns the checkpoint and the result log.

pub mod aggregate;
pub mod gate;
pub mod limiter;
pub mod pipeline;

pub use aggregate::{aggregate, write_artifact, OutputArtifact};
pub use gate::{LedgerGate, Verification};
pub use limiter::RateLimiter;
pub use pipeline::{PipelineEngine, RunReport};

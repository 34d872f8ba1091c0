// crates/strata-store/src/lib.rs
//
// strata-store: durable, crash-safe persistence for the strata engine.
//
// Two artifacts live here: the checkpoint (a single JSON document committed
// atomically by rename) and the result log (append-only JSON lines of
// completed items). The pipeline's dedicated writer task is the only
// component that writes either one.

pub mod checkpoint;
pub mod results;

pub use checkpoint::CheckpointStore;
pub use results::ResultLog;

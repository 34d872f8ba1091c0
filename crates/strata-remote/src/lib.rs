// crates/strata-remote/src/lib.rs
//
// strata-remote: concrete implementations of the engine's external
// collaborators: an HTTP ledger client and a subprocess-backed derivation
// oracle. Both sit behind the strata-core traits so the pipeline never
// depends on them directly.

pub mod ledger;
pub mod oracle;

pub use ledger::HttpLedgerClient;
pub use oracle::SubprocessOracle;

// crates/strata-cli/src/commands/mod.rs

pub mod aggregate;
pub mod run;
pub mod status;

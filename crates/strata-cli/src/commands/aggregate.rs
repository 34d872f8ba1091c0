// crates/strata-cli/src/commands/aggregate.rs
//
// `strata aggregate`: rebuild the output artifact from the checkpoint and
// the result log without touching the deriver or the ledger.

use clap::Args;

use strata_engine::{aggregate, write_artifact};
use strata_store::{CheckpointStore, ResultLog};

use crate::config::{expand_tilde, FileConfig};

/// Arguments for `strata aggregate`.
#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Checkpoint file path.
    #[arg(long)]
    pub checkpoint: Option<String>,

    /// Result log path.
    #[arg(long)]
    pub results: Option<String>,

    /// Output artifact path.
    #[arg(long)]
    pub output: Option<String>,
}

pub fn execute(file: FileConfig, args: AggregateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint_path = expand_tilde(args.checkpoint.as_deref().unwrap_or(&file.checkpoint_path));
    let results_path = expand_tilde(args.results.as_deref().unwrap_or(&file.results_path));
    let output_path = expand_tilde(args.output.as_deref().unwrap_or(&file.output_path));

    let checkpoint = CheckpointStore::new(&checkpoint_path).load(false)?;
    let items = ResultLog::new(&results_path).load()?;
    let artifact = aggregate(&checkpoint, items);
    write_artifact(&output_path, &artifact)?;

    tracing::info!("Output artifact written to {}", output_path.display());
    println!(
        "Aggregated {} items ({} with unverified on-chain status) into {}",
        artifact.items.len(),
        artifact.unknown_total,
        output_path.display()
    );
    Ok(())
}

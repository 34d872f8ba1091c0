// crates/strata-cli/src/commands/status.rs
//
// `strata status`: read the checkpoint and print committed progress with a
// per-layer breakdown. Never contacts the deriver or the ledger.

use strata_store::CheckpointStore;

use crate::config::{expand_tilde, FileConfig};

pub fn execute(file: FileConfig) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint_path = expand_tilde(&file.checkpoint_path);
    let checkpoint = CheckpointStore::new(&checkpoint_path).load(false)?;

    println!("Checkpoint: {}", checkpoint_path.display());
    println!("Last saved: {}", checkpoint.saved_at);
    println!("Committed items:   {}", checkpoint.counters.processed);
    println!("Derivable layers:  {}", checkpoint.counters.derivable);
    println!("On-chain true:     {}", checkpoint.counters.on_chain_true);
    println!("On-chain false:    {}", checkpoint.counters.on_chain_false);
    println!(
        "On-chain UNKNOWN:  {}  (unverified coverage, not confirmed absent)",
        checkpoint.counters.on_chain_unknown
    );

    if checkpoint.counters.per_layer.is_empty() {
        println!("No per-layer data recorded yet.");
    } else {
        println!("Per-layer breakdown:");
        for (layer, counters) in &checkpoint.counters.per_layer {
            println!(
                "  layer {}: derivable {}, true {}, false {}, unknown {}",
                layer,
                counters.derivable,
                counters.on_chain_true,
                counters.on_chain_false,
                counters.on_chain_unknown
            );
        }
    }
    Ok(())
}

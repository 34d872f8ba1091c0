// crates/strata-cli/src/commands/run.rs
//
// `strata run`: execute the pipeline over an input listing, wire ctrl-c to
// the graceful-shutdown watch, and write the output artifact at completion.

use std::sync::Arc;

use clap::Args;
use tokio::sync::watch;

use strata_core::{DerivationOracle, LedgerClient, SeedSource};
use strata_engine::{aggregate, write_artifact, OutputArtifact, PipelineEngine, RunReport};
use strata_remote::{HttpLedgerClient, SubprocessOracle};
use strata_store::{CheckpointStore, ResultLog};

use crate::config::{expand_tilde, FileConfig};
use crate::source::FileSeedSource;

/// Arguments for `strata run`. Flags override the config file.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Input listing: JSON array, JSON object (keys), or one id per line.
    #[arg(long)]
    pub input: String,

    /// Maximum number of derivation hops per item.
    #[arg(long)]
    pub max_layers: Option<u32>,

    /// Number of parallel workers.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Verify derived identities against the ledger even when the config
    /// file disables it.
    #[arg(long, conflicts_with = "no_rpc")]
    pub rpc: bool,

    /// Skip ledger verification entirely (records on-chain = unknown).
    #[arg(long)]
    pub no_rpc: bool,

    /// Checkpoint file path.
    #[arg(long)]
    pub checkpoint: Option<String>,

    /// Result log path.
    #[arg(long)]
    pub results: Option<String>,

    /// Output artifact path.
    #[arg(long)]
    pub output: Option<String>,

    /// Commit a checkpoint after every N completed items.
    #[arg(long)]
    pub save_every: Option<u64>,

    /// Discard a structurally corrupt checkpoint instead of aborting.
    /// Causes committed work to be redone; use deliberately.
    #[arg(long)]
    pub force_restart: bool,

    /// Deriver command, e.g. "python3 derive.py" (the seed is appended as
    /// the final argument per call).
    #[arg(long)]
    pub oracle_cmd: Option<String>,

    /// Base URL of the ledger's HTTP API.
    #[arg(long)]
    pub ledger_url: Option<String>,
}

pub async fn execute(
    mut file: FileConfig,
    args: RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    // CLI flags override the config file values.
    if let Some(v) = args.max_layers {
        file.max_layers = v;
    }
    if let Some(v) = args.concurrency {
        file.concurrency = v;
    }
    if args.rpc {
        file.rpc_enabled = true;
    }
    if args.no_rpc {
        file.rpc_enabled = false;
    }
    if let Some(v) = args.checkpoint {
        file.checkpoint_path = v;
    }
    if let Some(v) = args.results {
        file.results_path = v;
    }
    if let Some(v) = args.output {
        file.output_path = v;
    }
    if let Some(v) = args.save_every {
        file.save_every_n = v;
    }
    if let Some(v) = args.ledger_url {
        file.ledger_url = v;
    }
    if let Some(cmd) = args.oracle_cmd {
        file.oracle_command = cmd.split_whitespace().map(str::to_string).collect();
    }

    let run_config = file.to_run_config(args.force_restart);
    run_config.validate()?;

    let Some((program, leading_args)) = file.oracle_command.split_first() else {
        return Err(
            "no deriver configured: set oracle_command in the config file or pass --oracle-cmd"
                .into(),
        );
    };

    let seeds = FileSeedSource::new(expand_tilde(&args.input)).load()?;

    let oracle: Arc<dyn DerivationOracle> = Arc::new(
        SubprocessOracle::new(program.clone(), leading_args.to_vec())
            .with_timeout(run_config.call_timeout),
    );
    let ledger: Option<Arc<dyn LedgerClient>> = if run_config.rpc_enabled {
        tracing::info!("Ledger verification enabled against {}", file.ledger_url);
        Some(Arc::new(HttpLedgerClient::new(file.ledger_url.clone())))
    } else {
        tracing::info!("Ledger verification disabled; recording on-chain = unknown");
        None
    };

    // Ctrl-C requests a graceful shutdown: in-flight items finish their
    // current layer and a final checkpoint is flushed.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Shutdown requested; finishing in-flight layers and flushing state");
            let _ = shutdown_tx.send(true);
        }
    });

    let engine = PipelineEngine::new(run_config.clone(), oracle, ledger);
    let report = engine.run(seeds, shutdown_rx).await?;

    // Build and write the output artifact from the persisted state.
    let checkpoint = CheckpointStore::new(&run_config.checkpoint_path).load(false)?;
    let items = ResultLog::new(&run_config.results_path).load()?;
    let artifact = aggregate(&checkpoint, items);
    let output_path = expand_tilde(&file.output_path);
    write_artifact(&output_path, &artifact)?;
    tracing::info!("Output artifact written to {}", output_path.display());

    print_summary(&report, &artifact);

    if report.incomplete > 0 {
        // Interrupted runs exit non-zero so operators notice the remainder.
        std::process::exit(2);
    }
    Ok(())
}

fn print_summary(report: &RunReport, artifact: &OutputArtifact) {
    println!("Run summary");
    println!("  committed total:     {}", artifact.counters.processed);
    println!("  completed this run:  {}", report.completed);
    println!("  resumed (skipped):   {}", report.skipped);
    println!("  incomplete:          {}", report.incomplete);
    println!("  derivable layers:    {}", artifact.counters.derivable);
    println!("  on-chain true:       {}", artifact.counters.on_chain_true);
    println!("  on-chain false:      {}", artifact.counters.on_chain_false);
    println!(
        "  on-chain UNKNOWN:    {}  (unverified coverage, not confirmed absent)",
        artifact.unknown_total
    );
    for (layer, counters) in &artifact.counters.per_layer {
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

// crates/strata-cli/src/main.rs
//
// CLI entrypoint for the strata derivation engine.
//
// Initializes tracing, parses CLI arguments, loads configuration, and
// dispatches to the run / aggregate / status subcommands.

mod commands;
mod config;
mod source;

use clap::{Parser, Subcommand};
use commands::aggregate::AggregateArgs;
use commands::run::RunArgs;
use config::FileConfig;

/// Strata: checkpointed multi-layer derivation & verification engine.
#[derive(Parser, Debug)]
#[command(
    name = "strata",
    version = "0.1.0",
    about = "Drive seed collections through multi-hop derivation chains with checkpointed resume"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.strata/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the derivation pipeline over an input listing.
    Run(RunArgs),

    /// Rebuild the output artifact from the checkpoint and result log,
    /// touching no external collaborator.
    Aggregate(AggregateArgs),

    /// Show checkpoint progress for the configured run.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration from TOML file, falling back to defaults if the
    // file is not found.
    let file_config = match FileConfig::load(&cli.config) {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", cli.config);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                cli.config,
                e
            );
            FileConfig::default()
        }
    };

    match cli.command {
        Commands::Run(args) => commands::run::execute(file_config, args).await,
        Commands::Aggregate(args) => commands::aggregate::execute(file_config, args),
        Commands::Status => commands::status::execute(file_config),
    }
}

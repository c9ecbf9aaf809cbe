//! AO CLI - spawn processes, send messages, read results
//!
//! Thin terminal front-end over `ao-client`:
//! - `spawn` / `message` sign items with a wallet file and post them to the MU
//! - `result` / `dry-run` query the CU
//! - `keygen` / `address` manage Ed25519 wallet files

use std::process::ExitCode;
use std::sync::Arc;

use ao_client::{AoClient, AoConfig, Ed25519Signer, Signer};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Commands;

/// AO CLI application
#[derive(Parser)]
#[command(name = "ao")]
#[command(about = "AO - Messenger and Compute Unit client", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AO_CONFIG")]
    config: Option<String>,

    /// Messenger Unit URL
    #[arg(long, env = "AO_MU_URL")]
    mu_url: Option<String>,

    /// Compute Unit URL
    #[arg(long, env = "AO_CU_URL")]
    cu_url: Option<String>,

    /// Ed25519 wallet file used to sign spawns and messages
    #[arg(short, long, env = "AO_WALLET")]
    wallet: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output format (json, yaml)
    #[arg(short, long, default_value = "json")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).without_time())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AoConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.mu_url {
        config.mu_url = url;
    }
    if let Some(url) = cli.cu_url {
        config.cu_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout_secs = secs;
    }

    match cli.command {
        Commands::Keygen { path, force } => commands::keygen(&path, force),
        Commands::Address { path } => commands::address(&path),
        Commands::Config => output::print_single(&config, cli.output),
        command => {
            let signer = match cli.wallet.as_deref() {
                Some(path) => {
                    let signer: Arc<dyn Signer> = Arc::new(Ed25519Signer::from_key_file(path)?);
                    Some(signer)
                }
                None => None,
            };
            tracing::debug!(mu = %config.mu_url, cu = %config.cu_url, signer = signer.is_some(), "Client configured");
            let client = AoClient::from_config(config, signer)?;
            commands::execute(command, &client, cli.output).await
        }
    }
}

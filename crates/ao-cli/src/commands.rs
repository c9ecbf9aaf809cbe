//! Command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use ao_client::{AoClient, Ed25519Signer, Message, Tag};
use clap::Subcommand;
use serde_json::json;

use crate::output::{print_single, print_success, OutputFormat};

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Spawn a new process from a module
    Spawn {
        /// Module id the process runs
        module: String,

        /// Initial data
        #[arg(short, long)]
        data: Option<String>,

        /// Extra tags as Name=Value (repeatable)
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<Tag>,
    },

    /// Send a message to a process
    #[command(alias = "send")]
    Message {
        /// Target process id
        process: String,

        /// Message data
        #[arg(short, long, default_value = "")]
        data: String,

        /// Extra tags as Name=Value (repeatable)
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<Tag>,

        /// 32-byte anchor
        #[arg(long)]
        anchor: Option<String>,
    },

    /// Load the result of a message
    Result {
        /// Process id
        process: String,

        /// Message id
        message: String,
    },

    /// Evaluate a message without committing it
    DryRun {
        /// Target process id
        process: String,

        /// Message data
        #[arg(short, long, default_value = "")]
        data: String,

        /// Tags as Name=Value (repeatable)
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<Tag>,

        /// Owner to evaluate as
        #[arg(long, default_value = "")]
        owner: String,
    },

    /// Generate an Ed25519 wallet file
    Keygen {
        /// Where to write the key
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the address of a wallet file
    Address {
        /// Wallet file
        path: PathBuf,
    },

    /// Show the effective configuration
    Config,
}

/// Parse `Name=Value`
pub fn parse_tag(raw: &str) -> Result<Tag, String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok(Tag::new(name, value)),
        _ => Err(format!("expected Name=Value, got {:?}", raw)),
    }
}

fn non_empty(tags: Vec<Tag>) -> Option<Vec<Tag>> {
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// Execute a network command
pub async fn execute(command: Commands, client: &AoClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Spawn { module, data, tags } => {
            let id = client
                .spawn(&module, data.map(String::into_bytes), non_empty(tags))
                .await?;
            print_success("Process spawned");
            print_single(&json!({ "id": id }), format)
        }
        Commands::Message {
            process,
            data,
            tags,
            anchor,
        } => {
            let id = client
                .send_message(&process, &data, non_empty(tags), anchor.as_deref())
                .await?;
            print_success("Message sent");
            print_single(&json!({ "id": id }), format)
        }
        Commands::Result { process, message } => {
            let result = client.load_result(&process, &message).await?;
            print_single(&result, format)
        }
        Commands::DryRun {
            process,
            data,
            tags,
            owner,
        } => {
            let message = Message {
                target: process,
                owner,
                data,
                tags: non_empty(tags),
                ..Default::default()
            };
            let result = client.dry_run(&message).await?;
            print_single(&result, format)
        }
        Commands::Keygen { .. } | Commands::Address { .. } | Commands::Config => {
            bail!("command does not talk to the network")
        }
    }
}

/// Write a fresh wallet to `path`
pub fn keygen(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let signer = Ed25519Signer::generate();
    signer
        .save_key_file(path)
        .with_context(|| format!("writing {}", path.display()))?;
    print_success(&format!("Wallet written to {}", path.display()));
    println!("{}", signer.address());
    Ok(())
}

pub fn address(path: &Path) -> anyhow::Result<()> {
    let signer = Ed25519Signer::from_key_file(path)?;
    println!("{}", signer.address());
    Ok(())
}

//! tierctl - run cache operations against a configured cascade

mod handler;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tiercascade::{CascadeConfig, CascadeStore, StoreRegistry};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::handler::{Command, CommandHandler};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cascade configuration file
    #[arg(short, long, default_value = "cascade.toml")]
    config: PathBuf,

    /// Log tier activity to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so command output stays clean
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CascadeConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let cache = CascadeStore::from_config(&config, &StoreRegistry::with_defaults())
        .context("building cascade")?;
    debug!(tiers = cache.len(), "cascade ready");

    let handler = CommandHandler::new(Arc::new(cache));
    println!("{}", handler.handle(&args.command)?);

    Ok(())
}

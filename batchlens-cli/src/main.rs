//! Batchlens CLI
//!
//! Command-line interface for browsing batch job metadata across the
//! registered data sources.

mod commands;
mod config;

use anyhow::Result;
use batchlens_engine::registry::DEFAULT_DATA_SOURCE_ID;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "batchlens")]
#[command(about = "Batch job metadata browser", long_about = None)]
struct Cli {
    /// File holding the registered data sources
    #[arg(long, env = "BATCHLENS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data source to query
    #[arg(
        short,
        long,
        env = "BATCHLENS_SOURCE",
        default_value = DEFAULT_DATA_SOURCE_ID,
        global = true
    )]
    source: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batchlens_engine=info,batchlens_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        store_path: cli.config,
        source: cli.source,
    };

    handle_command(cli.command, &config).await
}

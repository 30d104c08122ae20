//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod datasource;
mod date;
mod job;
mod stats;
mod step;

pub use datasource::DataSourceCommands;
pub use job::JobCommands;
pub use step::StepCommands;

use anyhow::Result;
use batchlens_engine::BatchMonitor;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Data source management
    #[command(name = "datasource")]
    DataSource {
        #[command(subcommand)]
        command: DataSourceCommands,
    },
    /// Job execution queries
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Step execution queries
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Aggregate statistics for the selected data source
    Stats,
    /// Batch metadata tables present in the selected data source
    Tables,
    /// Check a date or date-time against the accepted formats
    CheckDate {
        /// Text to check
        text: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    if let Commands::CheckDate { text } = &command {
        return date::check_date(text);
    }

    let monitor = config.open_monitor()?;
    tracing::debug!("Selected data source: {}", config.source);

    let result = run_command(command, &monitor, &config.source).await;

    monitor.shutdown().await;
    result
}

async fn run_command(command: Commands, monitor: &BatchMonitor, source: &str) -> Result<()> {
    match command {
        Commands::DataSource { command } => {
            datasource::handle_datasource_command(command, monitor).await
        }
        Commands::Job { command } => {
            require_source(monitor, source)?;
            job::handle_job_command(command, monitor, source).await
        }
        Commands::Step { command } => {
            require_source(monitor, source)?;
            step::handle_step_command(command, monitor, source).await
        }
        Commands::Stats => {
            require_source(monitor, source)?;
            stats::show_statistics(monitor, source).await
        }
        Commands::Tables => {
            require_source(monitor, source)?;
            stats::list_tables(monitor, source).await
        }
        Commands::CheckDate { text } => date::check_date(&text),
    }
}

/// Fail when `source` is not a registered data source id
///
/// The engine answers queries for unknown ids with empty results, which
/// would otherwise print as "nothing found".
fn require_source(monitor: &BatchMonitor, source: &str) -> Result<()> {
    if !monitor.registry().contains(source) {
        anyhow::bail!(
            "No data source with id '{}' (see `batchlens datasource list`)",
            source
        );
    }
    Ok(())
}

/// Color a batch status the way the job and step listings show it
pub(crate) fn colorize_status(status: Option<&str>) -> ColoredString {
    match status {
        Some("COMPLETED") => "COMPLETED".green(),
        Some("FAILED") => "FAILED".red(),
        Some(s @ ("STARTED" | "STARTING")) => s.cyan(),
        Some(s @ ("STOPPED" | "STOPPING" | "ABANDONED")) => s.yellow(),
        Some(other) => other.normal(),
        None => "-".dimmed(),
    }
}

/// Render an optional timestamp, `-` when absent
pub(crate) fn format_time(time: Option<chrono::NaiveDateTime>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

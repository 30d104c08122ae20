//! Data source command handlers
//!
//! Registers, edits and checks the databases the other commands query.

use anyhow::{Context, Result};
use batchlens_core::domain::datasource::{DataSourceConfig, DatabaseKind};
use batchlens_engine::BatchMonitor;
use clap::Subcommand;
use colored::*;
use std::path::{Path, PathBuf};

/// Data source subcommands
#[derive(Subcommand)]
pub enum DataSourceCommands {
    /// List registered data sources
    List {
        /// Only show active data sources
        #[arg(long)]
        active: bool,
    },
    /// Register a new data source
    Add {
        /// Display name
        name: String,

        /// Database kind (postgres, mysql, sqlite)
        #[arg(short, long)]
        kind: DatabaseKind,

        /// Connection URL; defaults to the kind's template
        #[arg(short, long)]
        url: Option<String>,

        /// Explicit id; generated when omitted
        #[arg(long)]
        id: Option<String>,

        #[arg(long, default_value = "")]
        username: String,

        #[arg(long, env = "BATCHLENS_DB_PASSWORD", default_value = "", hide_env_values = true)]
        password: String,

        /// Driver identifier overriding the kind's default
        #[arg(long)]
        driver: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a data source
    Remove {
        id: String,
    },
    /// Mark a data source active
    Activate {
        id: String,
    },
    /// Mark a data source inactive
    Deactivate {
        id: String,
    },
    /// Open one connection with a data source's settings
    Test {
        id: String,
    },
    /// Write every data source as JSON, credentials included
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace every data source with the contents of a JSON file
    Import {
        file: PathBuf,
    },
    /// Remove every data source
    Clear,
}

/// Handle data source commands
pub async fn handle_datasource_command(
    command: DataSourceCommands,
    monitor: &BatchMonitor,
) -> Result<()> {
    match command {
        DataSourceCommands::List { active } => list_data_sources(monitor, active),
        DataSourceCommands::Add {
            name,
            kind,
            url,
            id,
            username,
            password,
            driver,
            description,
        } => {
            let mut config = DataSourceConfig::new(
                id.unwrap_or_default(),
                name,
                kind,
                url.unwrap_or_else(|| kind.default_url().to_string()),
                username,
                password,
            );
            if let Some(driver) = driver {
                config = config.with_driver(driver);
            }
            if let Some(description) = description {
                config = config.with_description(description);
            }
            add_data_source(monitor, config)
        }
        DataSourceCommands::Remove { id } => remove_data_source(monitor, &id).await,
        DataSourceCommands::Activate { id } => set_active(monitor, &id, true),
        DataSourceCommands::Deactivate { id } => set_active(monitor, &id, false),
        DataSourceCommands::Test { id } => test_data_source(monitor, &id).await,
        DataSourceCommands::Export { output } => export_data_sources(monitor, output),
        DataSourceCommands::Import { file } => import_data_sources(monitor, &file).await,
        DataSourceCommands::Clear => {
            monitor.clear_data_sources().await;
            println!("{}", "✓ All data sources removed".green());
            Ok(())
        }
    }
}

fn list_data_sources(monitor: &BatchMonitor, active_only: bool) -> Result<()> {
    let configs = if active_only {
        monitor.registry().list_active()
    } else {
        monitor.registry().list_all()
    };

    if configs.is_empty() {
        println!("{}", "No data sources registered.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} data source(s):", configs.len()).bold());
    println!();
    for config in configs {
        print_data_source(&config);
    }

    Ok(())
}

fn add_data_source(monitor: &BatchMonitor, config: DataSourceConfig) -> Result<()> {
    let added = monitor.registry().add(config)?;

    println!("{}", "✓ Data source added".green());
    println!();
    print_data_source(&added);

    Ok(())
}

async fn remove_data_source(monitor: &BatchMonitor, id: &str) -> Result<()> {
    if monitor.remove_data_source(id).await {
        println!("{} {}", "✓ Removed".green(), id.cyan());
    } else {
        println!("{}", format!("No data source with id '{}'.", id).yellow());
    }
    Ok(())
}

fn set_active(monitor: &BatchMonitor, id: &str, active: bool) -> Result<()> {
    monitor.registry().set_active(id, active)?;

    let state = if active { "active" } else { "inactive" };
    println!("{} {} is now {}", "✓".green(), id.cyan(), state);
    Ok(())
}

async fn test_data_source(monitor: &BatchMonitor, id: &str) -> Result<()> {
    let config = monitor
        .registry()
        .get(id)
        .with_context(|| format!("No data source with id '{}'", id))?;

    println!("Testing connection to {}...", config.to_string().cyan());

    if monitor.pools().test_connection(&config).await {
        println!("{}", "✓ Connection succeeded".green());
        Ok(())
    } else {
        anyhow::bail!("Connection to '{}' failed", id)
    }
}

fn export_data_sources(monitor: &BatchMonitor, output: Option<PathBuf>) -> Result<()> {
    let payload = monitor.registry().export_all()?;

    match output {
        Some(path) => {
            std::fs::write(&path, payload)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} {}", "✓ Exported to".green(), path.display());
        }
        None => println!("{}", payload),
    }

    Ok(())
}

async fn import_data_sources(monitor: &BatchMonitor, file: &Path) -> Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let count = monitor.import_data_sources(&payload).await?;
    println!("{}", format!("✓ Imported {} data source(s)", count).green());

    Ok(())
}

fn print_data_source(config: &DataSourceConfig) {
    let state = if config.active {
        "active".green()
    } else {
        "inactive".dimmed()
    };

    println!("  {} {} {}", "▸".cyan(), config.name.bold(), config.id.dimmed());
    println!("    Kind:     {} ({})", config.kind, config.effective_driver());
    println!("    URL:      {}", config.url);
    if !config.username.is_empty() {
        println!("    User:     {}", config.username);
    }
    println!("    State:    {}", state);
    if let Some(description) = &config.description {
        println!("    About:    {}", description.dimmed());
    }
    println!();
}

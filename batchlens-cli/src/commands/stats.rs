//! Statistics and schema command handlers

use anyhow::Result;
use batchlens_engine::BatchMonitor;
use colored::*;

/// Print the statistics snapshot of one data source
pub async fn show_statistics(monitor: &BatchMonitor, source: &str) -> Result<()> {
    let Some(snapshot) = monitor.collect_statistics(source).await? else {
        println!("{}", format!("No data source with id '{}'.", source).yellow());
        return Ok(());
    };

    println!(
        "{}",
        format!(
            "Statistics for {} at {}:",
            snapshot.data_source_id,
            snapshot.collected_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .bold()
    );
    println!();

    for item in &snapshot.items {
        println!(
            "  {:<24} {:>10}  {}",
            item.label,
            item.value.to_string().cyan(),
            item.description.dimmed()
        );
    }

    Ok(())
}

/// Print the batch metadata tables found in one data source
pub async fn list_tables(monitor: &BatchMonitor, source: &str) -> Result<()> {
    let tables = monitor.queries().list_batch_tables(source).await?;

    if tables.is_empty() {
        println!("{}", "No batch tables found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} batch table(s):", tables.len()).bold());
    for table in tables {
        println!("  {} {}", "▸".cyan(), table);
    }

    Ok(())
}

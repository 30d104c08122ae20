//! Date check command

use anyhow::Result;
use batchlens_core::datetime;
use colored::*;

pub fn check_date(text: &str) -> Result<()> {
    let check = datetime::validate(text);

    if !check.is_valid() {
        anyhow::bail!("{}", check.message);
    }

    if text.trim().is_empty() {
        println!("{}", "Empty input: no date filter applies.".dimmed());
        return Ok(());
    }

    println!("{} {}", "✓".green(), check.message);
    if let (Some(start), Some(end)) = (
        datetime::parse_range_start(text),
        datetime::parse_range_end(text),
    ) {
        println!("  As range start: {}", start.format("%Y-%m-%d %H:%M:%S"));
        println!("  As range end:   {}", end.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}

//! Job command handlers
//!
//! Lists and searches job executions of the selected data source and
//! shows the details of a single execution.

use anyhow::Result;
use batchlens_core::datetime;
use batchlens_core::domain::job::JobExecution;
use batchlens_core::dto::filter::JobExecutionFilter;
use batchlens_engine::BatchMonitor;
use clap::Subcommand;
use colored::*;

use super::{colorize_status, format_time};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Most recent job executions
    Recent,
    /// Search job executions
    Search {
        /// Job name substring
        #[arg(long)]
        name: Option<String>,

        /// Exact status, e.g. COMPLETED or FAILED
        #[arg(long)]
        status: Option<String>,

        /// Started at or after this date/date-time
        #[arg(long)]
        from: Option<String>,

        /// Ended at or before this date/date-time
        #[arg(long)]
        to: Option<String>,

        /// Substring of the job name or exit message
        #[arg(short, long)]
        keyword: Option<String>,
    },
    /// Show one job execution with its steps
    Get {
        /// Job execution id
        id: i64,
    },
    /// Show the parameters of one job execution
    Params {
        /// Job execution id
        id: i64,
    },
}

/// Handle job commands
pub async fn handle_job_command(
    command: JobCommands,
    monitor: &BatchMonitor,
    source: &str,
) -> Result<()> {
    match command {
        JobCommands::Recent => {
            let executions = monitor.queries().list_recent_job_executions(source).await?;
            print_job_list(&executions);
            Ok(())
        }
        JobCommands::Search {
            name,
            status,
            from,
            to,
            keyword,
        } => {
            warn_on_bad_date("--from", from.as_deref());
            warn_on_bad_date("--to", to.as_deref());

            let filter = JobExecutionFilter {
                job_name: name,
                status,
                start_date: from,
                end_date: to,
                keyword,
            };
            let executions = monitor.queries().search_job_executions(source, &filter).await?;
            print_job_list(&executions);
            Ok(())
        }
        JobCommands::Get { id } => get_job_execution(monitor, source, id).await,
        JobCommands::Params { id } => list_parameters(monitor, source, id).await,
    }
}

/// Unparseable dates are ignored by the search; say so up front
pub(crate) fn warn_on_bad_date(flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        let check = datetime::validate(value);
        if !check.is_valid() {
            println!(
                "{}",
                format!("⚠ Ignoring {} '{}': {}", flag, value, check.message).yellow()
            );
        }
    }
}

async fn get_job_execution(monitor: &BatchMonitor, source: &str, id: i64) -> Result<()> {
    let Some(execution) = monitor.queries().get_job_execution(source, id).await? else {
        println!("{}", format!("No job execution {} in '{}'.", id, source).yellow());
        return Ok(());
    };

    print_job_details(&execution);

    let steps = monitor.queries().list_step_executions(source, id).await?;
    if !steps.is_empty() {
        println!("\n{}", "Steps:".bold());
        for step in &steps {
            println!(
                "  {} {:<24} {:<10} {:>8}  read {} / write {} / skip {}",
                "▸".cyan(),
                step.step_name,
                colorize_status(step.status.as_deref()),
                step.formatted_duration(),
                step.read_count,
                step.write_count,
                step.skip_count()
            );
        }
    }

    Ok(())
}

async fn list_parameters(monitor: &BatchMonitor, source: &str, id: i64) -> Result<()> {
    let params = monitor.queries().list_job_parameters(source, id).await?;

    if params.is_empty() {
        println!("{}", format!("No parameters for job execution {}.", id).yellow());
        return Ok(());
    }

    println!("{}", format!("Parameters of job execution {}:", id).bold());
    for param in params {
        println!("  {} = {}", param.key.cyan(), param.display_value());
    }

    Ok(())
}

fn print_job_list(executions: &[JobExecution]) {
    if executions.is_empty() {
        println!("{}", "No job executions found.".yellow());
        return;
    }

    println!(
        "{}",
        format!("Found {} job execution(s):", executions.len()).bold()
    );
    println!();
    for execution in executions {
        println!(
            "  {} {:>6}  {:<28} {:<10} {}  {}",
            "▸".cyan(),
            execution.id.to_string().dimmed(),
            execution.job_name,
            colorize_status(execution.status.as_deref()),
            format_time(execution.start_time),
            execution.formatted_duration().dimmed()
        );
    }
}

fn print_job_details(execution: &JobExecution) {
    println!("{}", "Job Execution:".bold());
    println!("  ID:          {}", execution.id.to_string().cyan());
    println!("  Job:         {}", execution.job_name);
    println!("  Instance:    {}", execution.job_instance_id);
    println!("  Status:      {}", colorize_status(execution.status.as_deref()));
    println!("  Created:     {}", format_time(execution.create_time));
    println!("  Started:     {}", format_time(execution.start_time));
    println!("  Ended:       {}", format_time(execution.end_time));
    println!("  Duration:    {}", execution.formatted_duration());
    if let Some(updated) = execution.last_updated {
        println!("  Updated:     {}", format_time(Some(updated)));
    }
    if let Some(version) = execution.version {
        println!("  Version:     {}", version);
    }
    if let Some(exit_code) = &execution.exit_code {
        println!("  Exit code:   {}", exit_code);
    }
    if let Some(message) = execution.exit_message.as_deref().filter(|m| !m.is_empty()) {
        println!("  Exit message:\n    {}", message.red());
    }
}

//! Step command handlers

use anyhow::Result;
use batchlens_core::domain::step::StepExecution;
use batchlens_core::dto::filter::StepExecutionFilter;
use batchlens_engine::BatchMonitor;
use clap::Subcommand;
use colored::*;

use super::job::warn_on_bad_date;
use super::{colorize_status, format_time};

/// Step subcommands
#[derive(Subcommand)]
pub enum StepCommands {
    /// Steps of one job execution, in start order
    List {
        /// Job execution id
        job_execution_id: i64,
    },
    /// Search step executions
    Search {
        /// Step name substring
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        /// Only steps of this job execution
        #[arg(long)]
        job: Option<i64>,
    },
}

/// Handle step commands
pub async fn handle_step_command(
    command: StepCommands,
    monitor: &BatchMonitor,
    source: &str,
) -> Result<()> {
    let steps = match command {
        StepCommands::List { job_execution_id } => {
            monitor
                .queries()
                .list_step_executions(source, job_execution_id)
                .await?
        }
        StepCommands::Search {
            name,
            status,
            from,
            to,
            job,
        } => {
            warn_on_bad_date("--from", from.as_deref());
            warn_on_bad_date("--to", to.as_deref());

            let filter = StepExecutionFilter {
                step_name: name,
                status,
                start_date: from,
                end_date: to,
                job_execution_id: job,
            };
            monitor.queries().search_step_executions(source, &filter).await?
        }
    };

    print_step_list(&steps);
    Ok(())
}

fn print_step_list(steps: &[StepExecution]) {
    if steps.is_empty() {
        println!("{}", "No step executions found.".yellow());
        return;
    }

    println!("{}", format!("Found {} step execution(s):", steps.len()).bold());
    println!();
    for step in steps {
        println!(
            "  {} {} {} (job execution {})",
            "▸".cyan(),
            step.step_name.bold(),
            step.id.to_string().dimmed(),
            step.job_execution_id
        );
        println!("    Status:   {}", colorize_status(step.status.as_deref()));
        println!(
            "    Time:     {} ({})",
            format_time(step.start_time),
            step.formatted_duration()
        );
        println!(
            "    Counts:   read {}, write {}, commit {}, rollback {}, filter {}",
            step.read_count,
            step.write_count,
            step.commit_count,
            step.rollback_count,
            step.filter_count
        );
        println!(
            "    Skips:    read {}, process {}, write {}",
            step.read_skip_count, step.process_skip_count, step.write_skip_count
        );
        println!();
    }
}

//! Step Execution Repository
//!
//! Reads `BATCH_STEP_EXECUTION`.

use batchlens_core::datetime;
use batchlens_core::domain::step::StepExecution;
use batchlens_core::dto::filter::{StepExecutionFilter, non_blank};
use chrono::NaiveDateTime;

use super::{SEARCH_LIMIT, date_bound};
use crate::db::{BatchConnection, fetch_rows};
use crate::query::{Dialect, SqlBuilder, SqlParam, SqlQuery};

/// Counter columns, in row-struct order
const COUNTERS: [&str; 8] = [
    "READ_COUNT",
    "WRITE_COUNT",
    "COMMIT_COUNT",
    "ROLLBACK_COUNT",
    "READ_SKIP_COUNT",
    "PROCESS_SKIP_COUNT",
    "WRITE_SKIP_COUNT",
    "FILTER_COUNT",
];

/// Steps of one job execution, in start order
pub async fn find_by_job_execution(
    conn: &mut BatchConnection,
    job_execution_id: i64,
) -> Result<Vec<StepExecution>, sqlx::Error> {
    let query = SqlBuilder::new(conn.dialect(), step_select(conn.dialect()))
        .and("se.JOB_EXECUTION_ID = ?", vec![SqlParam::Int(job_execution_id)])
        .order_by("se.START_TIME ASC, se.STEP_EXECUTION_ID ASC")
        .build();

    let rows = fetch_rows!(conn, query, StepExecutionRow, fetch_all)?;
    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Step executions matching every present criterion of `filter`
pub async fn search(
    conn: &mut BatchConnection,
    filter: &StepExecutionFilter,
) -> Result<Vec<StepExecution>, sqlx::Error> {
    let query = search_query(conn.dialect(), filter);
    tracing::debug!("Step execution search: {}", query.sql());

    let rows = fetch_rows!(conn, query, StepExecutionRow, fetch_all)?;
    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Query Construction
// =============================================================================

/// Counters are cast so INT and BIGINT schemas decode alike
fn step_select(dialect: Dialect) -> String {
    let counters = COUNTERS
        .iter()
        .map(|column| {
            format!(
                "CAST(se.{} AS {}) AS {}",
                column,
                dialect.bigint(),
                column.to_ascii_lowercase()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT se.STEP_EXECUTION_ID AS step_execution_id, \
         se.JOB_EXECUTION_ID AS job_execution_id, se.STEP_NAME AS step_name, \
         se.START_TIME AS start_time, se.END_TIME AS end_time, se.STATUS AS status, \
         se.EXIT_CODE AS exit_code, se.EXIT_MESSAGE AS exit_message, {} \
         FROM BATCH_STEP_EXECUTION se",
        counters
    )
}

fn search_query(dialect: Dialect, filter: &StepExecutionFilter) -> SqlQuery {
    SqlBuilder::new(dialect, step_select(dialect))
        .and_opt(
            "se.STEP_NAME LIKE ?",
            non_blank(&filter.step_name).map(SqlParam::contains),
        )
        .and_opt("se.STATUS = ?", non_blank(&filter.status).map(SqlParam::text))
        .and_opt(
            "se.START_TIME >= ?",
            date_bound(
                non_blank(&filter.start_date),
                datetime::parse_range_start,
                "start date",
            ),
        )
        .and_opt(
            "se.END_TIME <= ?",
            date_bound(
                non_blank(&filter.end_date),
                datetime::parse_range_end,
                "end date",
            ),
        )
        .and_opt(
            "se.JOB_EXECUTION_ID = ?",
            filter.job_execution_id.map(SqlParam::Int),
        )
        .order_by("se.START_TIME DESC")
        .limit(SEARCH_LIMIT)
        .build()
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct StepExecutionRow {
    step_execution_id: i64,
    job_execution_id: i64,
    step_name: String,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    status: Option<String>,
    exit_code: Option<String>,
    exit_message: Option<String>,
    read_count: Option<i64>,
    write_count: Option<i64>,
    commit_count: Option<i64>,
    rollback_count: Option<i64>,
    read_skip_count: Option<i64>,
    process_skip_count: Option<i64>,
    write_skip_count: Option<i64>,
    filter_count: Option<i64>,
}

impl From<StepExecutionRow> for StepExecution {
    fn from(row: StepExecutionRow) -> Self {
        StepExecution {
            id: row.step_execution_id,
            job_execution_id: row.job_execution_id,
            step_name: row.step_name,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            exit_code: row.exit_code,
            exit_message: row.exit_message,
            read_count: row.read_count.unwrap_or(0),
            write_count: row.write_count.unwrap_or(0),
            commit_count: row.commit_count.unwrap_or(0),
            rollback_count: row.rollback_count.unwrap_or(0),
            read_skip_count: row.read_skip_count.unwrap_or(0),
            process_skip_count: row.process_skip_count.unwrap_or(0),
            write_skip_count: row.write_skip_count.unwrap_or(0),
            filter_count: row.filter_count.unwrap_or(0),
        }
    }
}

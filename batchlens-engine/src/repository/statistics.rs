//! Statistics Repository
//!
//! Scalar aggregates over the metadata tables. Each query returns exactly
//! one 64-bit integer.

use crate::db::{BatchConnection, fetch_scalar};
use crate::query::{Dialect, SqlBuilder, SqlParam, SqlQuery};

/// Row count of `table`, optionally restricted to one `STATUS`
pub async fn count(
    conn: &mut BatchConnection,
    table: Table,
    status: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let query = count_query(conn.dialect(), table, status);
    fetch_scalar!(conn, query, i64, fetch_one)
}

/// Number of distinct job names among the job instances
pub async fn count_distinct_job_names(conn: &mut BatchConnection) -> Result<i64, sqlx::Error> {
    let query = SqlBuilder::new(
        conn.dialect(),
        "SELECT COUNT(DISTINCT JOB_NAME) FROM BATCH_JOB_INSTANCE",
    )
    .build();
    fetch_scalar!(conn, query, i64, fetch_one)
}

/// Sum of a step counter expression over every step execution; 0 when empty
pub async fn sum_step_counters(
    conn: &mut BatchConnection,
    expression: StepCounters,
) -> Result<i64, sqlx::Error> {
    let query = sum_query(conn.dialect(), expression);
    fetch_scalar!(conn, query, i64, fetch_one)
}

/// Tables that can be counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    JobExecution,
    StepExecution,
    JobInstance,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::JobExecution => "BATCH_JOB_EXECUTION",
            Table::StepExecution => "BATCH_STEP_EXECUTION",
            Table::JobInstance => "BATCH_JOB_INSTANCE",
        }
    }
}

/// Step counter sums that can be aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCounters {
    Read,
    Written,
    /// Read, process and write skips combined
    Skipped,
}

impl StepCounters {
    fn expression(self) -> &'static str {
        match self {
            StepCounters::Read => "READ_COUNT",
            StepCounters::Written => "WRITE_COUNT",
            StepCounters::Skipped => "READ_SKIP_COUNT + PROCESS_SKIP_COUNT + WRITE_SKIP_COUNT",
        }
    }
}

fn count_query(dialect: Dialect, table: Table, status: Option<&str>) -> SqlQuery {
    SqlBuilder::new(dialect, format!("SELECT COUNT(*) FROM {}", table.name()))
        .and_opt("STATUS = ?", status.map(SqlParam::text))
        .build()
}

/// `SUM` is NUMERIC/DECIMAL on some backends, so the total is cast back
fn sum_query(dialect: Dialect, counters: StepCounters) -> SqlQuery {
    SqlBuilder::new(
        dialect,
        format!(
            "SELECT CAST(COALESCE(SUM({}), 0) AS {}) FROM BATCH_STEP_EXECUTION",
            counters.expression(),
            dialect.bigint()
        ),
    )
    .build()
}

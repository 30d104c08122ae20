//! Job Execution Repository
//!
//! Reads `BATCH_JOB_EXECUTION` joined with `BATCH_JOB_INSTANCE`, and the
//! parameters recorded for each execution.

use batchlens_core::datetime;
use batchlens_core::domain::job::{JobExecution, JobParameter, ParameterValue};
use batchlens_core::dto::filter::{JobExecutionFilter, non_blank};
use chrono::NaiveDateTime;

use super::{RECENT_LIMIT, SEARCH_LIMIT, date_bound};
use crate::db::{BatchConnection, fetch_rows};
use crate::query::{Dialect, SqlBuilder, SqlParam, SqlQuery};

const JOB_EXECUTION_SELECT: &str = "SELECT je.JOB_EXECUTION_ID AS job_execution_id, \
     je.JOB_INSTANCE_ID AS job_instance_id, ji.JOB_NAME AS job_name, \
     je.START_TIME AS start_time, je.END_TIME AS end_time, je.STATUS AS status, \
     je.EXIT_CODE AS exit_code, je.EXIT_MESSAGE AS exit_message \
     FROM BATCH_JOB_EXECUTION je \
     JOIN BATCH_JOB_INSTANCE ji ON je.JOB_INSTANCE_ID = ji.JOB_INSTANCE_ID";

const JOB_EXECUTION_DETAIL_SELECT: &str = "SELECT je.JOB_EXECUTION_ID AS job_execution_id, \
     je.JOB_INSTANCE_ID AS job_instance_id, ji.JOB_NAME AS job_name, \
     je.START_TIME AS start_time, je.END_TIME AS end_time, je.STATUS AS status, \
     je.EXIT_CODE AS exit_code, je.EXIT_MESSAGE AS exit_message, \
     je.CREATE_TIME AS create_time, je.LAST_UPDATED AS last_updated, je.VERSION AS version \
     FROM BATCH_JOB_EXECUTION je \
     JOIN BATCH_JOB_INSTANCE ji ON je.JOB_INSTANCE_ID = ji.JOB_INSTANCE_ID";

const JOB_PARAMETER_SELECT: &str = "SELECT KEY_NAME AS key_name, TYPE_CD AS type_cd, \
     STRING_VAL AS string_val, DATE_VAL AS date_val, LONG_VAL AS long_val, \
     DOUBLE_VAL AS double_val, IDENTIFYING AS identifying \
     FROM BATCH_JOB_EXECUTION_PARAMS";

const NEWEST_FIRST: &str = "je.START_TIME DESC";

/// Most recent executions, newest start first
pub async fn list_recent(conn: &mut BatchConnection) -> Result<Vec<JobExecution>, sqlx::Error> {
    let query = recent_query(conn.dialect());

    let rows = fetch_rows!(conn, query, JobExecutionRow, fetch_all)?;
    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Executions matching every present criterion of `filter`
pub async fn search(
    conn: &mut BatchConnection,
    filter: &JobExecutionFilter,
) -> Result<Vec<JobExecution>, sqlx::Error> {
    let query = search_query(conn.dialect(), filter);
    tracing::debug!("Job execution search: {}", query.sql());

    let rows = fetch_rows!(conn, query, JobExecutionRow, fetch_all)?;
    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Find one execution by ID, including its bookkeeping columns
pub async fn find_by_id(
    conn: &mut BatchConnection,
    job_execution_id: i64,
) -> Result<Option<JobExecution>, sqlx::Error> {
    let query = SqlBuilder::new(conn.dialect(), JOB_EXECUTION_DETAIL_SELECT)
        .and("je.JOB_EXECUTION_ID = ?", vec![SqlParam::Int(job_execution_id)])
        .build();

    let row = fetch_rows!(conn, query, JobExecutionRow, fetch_optional)?;
    Ok(row.map(|r| r.into()))
}

/// Parameters of one execution, ordered by key
pub async fn find_parameters(
    conn: &mut BatchConnection,
    job_execution_id: i64,
) -> Result<Vec<JobParameter>, sqlx::Error> {
    let query = SqlBuilder::new(conn.dialect(), JOB_PARAMETER_SELECT)
        .and("JOB_EXECUTION_ID = ?", vec![SqlParam::Int(job_execution_id)])
        .order_by("KEY_NAME")
        .build();

    let rows = fetch_rows!(conn, query, JobParameterRow, fetch_all)?;
    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Query Construction
// =============================================================================

fn recent_query(dialect: Dialect) -> SqlQuery {
    SqlBuilder::new(dialect, JOB_EXECUTION_SELECT)
        .order_by(NEWEST_FIRST)
        .limit(RECENT_LIMIT)
        .build()
}

fn search_query(dialect: Dialect, filter: &JobExecutionFilter) -> SqlQuery {
    let mut builder = SqlBuilder::new(dialect, JOB_EXECUTION_SELECT)
        .and_opt(
            "ji.JOB_NAME LIKE ?",
            non_blank(&filter.job_name).map(SqlParam::contains),
        )
        .and_opt("je.STATUS = ?", non_blank(&filter.status).map(SqlParam::text))
        .and_opt(
            "je.START_TIME >= ?",
            date_bound(
                non_blank(&filter.start_date),
                datetime::parse_range_start,
                "start date",
            ),
        )
        .and_opt(
            "je.END_TIME <= ?",
            date_bound(
                non_blank(&filter.end_date),
                datetime::parse_range_end,
                "end date",
            ),
        );

    if let Some(keyword) = non_blank(&filter.keyword) {
        builder = builder.and(
            "(ji.JOB_NAME LIKE ? OR je.EXIT_MESSAGE LIKE ?)",
            vec![SqlParam::contains(keyword), SqlParam::contains(keyword)],
        );
    }

    builder.order_by(NEWEST_FIRST).limit(SEARCH_LIMIT).build()
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobExecutionRow {
    job_execution_id: i64,
    job_instance_id: i64,
    job_name: String,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    status: Option<String>,
    exit_code: Option<String>,
    exit_message: Option<String>,
    #[sqlx(default)]
    create_time: Option<NaiveDateTime>,
    #[sqlx(default)]
    last_updated: Option<NaiveDateTime>,
    #[sqlx(default)]
    version: Option<i64>,
}

impl From<JobExecutionRow> for JobExecution {
    fn from(row: JobExecutionRow) -> Self {
        JobExecution {
            id: row.job_execution_id,
            job_instance_id: row.job_instance_id,
            job_name: row.job_name,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            exit_code: row.exit_code,
            exit_message: row.exit_message,
            create_time: row.create_time,
            last_updated: row.last_updated,
            version: row.version,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JobParameterRow {
    key_name: String,
    type_cd: Option<String>,
    string_val: Option<String>,
    date_val: Option<NaiveDateTime>,
    long_val: Option<i64>,
    double_val: Option<f64>,
    identifying: Option<String>,
}

impl From<JobParameterRow> for JobParameter {
    fn from(row: JobParameterRow) -> Self {
        let type_cd = row.type_cd.unwrap_or_default().trim().to_ascii_uppercase();

        let value = match type_cd.as_str() {
            "STRING" => ParameterValue::String(row.string_val),
            "DATE" => ParameterValue::Date(row.date_val),
            "LONG" => ParameterValue::Long(row.long_val),
            "DOUBLE" => ParameterValue::Double(row.double_val),
            _ => ParameterValue::Other(type_cd),
        };

        let identifying = row
            .identifying
            .map(|flag| flag.trim().eq_ignore_ascii_case("Y"))
            .unwrap_or(false);

        JobParameter {
            key: row.key_name,
            value,
            identifying,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_query() {
        let query = recent_query(Dialect::Sqlite);
        assert!(query.sql().ends_with(" ORDER BY je.START_TIME DESC LIMIT 100"));
        assert!(!query.sql().contains("WHERE"));
    }

    #[test]
    fn test_empty_filter_has_no_predicates() {
        let query = search_query(Dialect::Postgres, &JobExecutionFilter::new().status("   "));
        assert!(!query.sql().contains("WHERE"));
        assert!(query.sql().ends_with("LIMIT 500"));
    }

    #[test]
    fn test_full_filter_binds_in_order() {
        let filter = JobExecutionFilter::new()
            .job_name("import")
            .status("FAILED")
            .start_date("2024-01-01")
            .end_date("2024/1/31")
            .keyword("timeout");
        let query = search_query(Dialect::Postgres, &filter);

        assert!(query.sql().contains(
            "WHERE ji.JOB_NAME LIKE $1 AND je.STATUS = $2 AND je.START_TIME >= $3 \
             AND je.END_TIME <= $4 AND (ji.JOB_NAME LIKE $5 OR je.EXIT_MESSAGE LIKE $6)"
        ));

        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(
            query.params(),
            &[
                SqlParam::text("%import%"),
                SqlParam::text("FAILED"),
                SqlParam::Timestamp(start),
                SqlParam::Timestamp(end),
                SqlParam::text("%timeout%"),
                SqlParam::text("%timeout%"),
            ]
        );
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        let filter = JobExecutionFilter::new()
            .start_date("yesterday")
            .end_date("2024-13-45")
            .status("COMPLETED");
        let query = search_query(Dialect::MySql, &filter);

        assert_eq!(query.params(), &[SqlParam::text("COMPLETED")]);
        assert!(!query.sql().contains("START_TIME >="));
        assert!(!query.sql().contains("END_TIME <="));
    }

    #[test]
    fn test_parameter_row_mapping() {
        let row = JobParameterRow {
            key_name: "run.id".to_string(),
            type_cd: Some("long".to_string()),
            string_val: Some(String::new()),
            date_val: None,
            long_val: Some(7),
            double_val: Some(0.0),
            identifying: Some("Y".to_string()),
        };
        let param: JobParameter = row.into();

        assert_eq!(param.value, ParameterValue::Long(Some(7)));
        assert!(param.identifying);
        assert_eq!(param.display_value(), "7 (LONG) [identifying]");

        let row = JobParameterRow {
            key_name: "custom".to_string(),
            type_cd: Some("BLOB".to_string()),
            string_val: None,
            date_val: None,
            long_val: None,
            double_val: None,
            identifying: Some("N".to_string()),
        };
        let param: JobParameter = row.into();
        assert_eq!(param.value, ParameterValue::Other("BLOB".to_string()));
        assert!(!param.identifying);
    }
}

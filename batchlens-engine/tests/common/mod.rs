//! SQLite fixture holding a small batch metadata schema
//!
//! Three job executions (COMPLETED, FAILED, STARTED) over two job names,
//! five step executions with known counters, and four parameters on the
//! first execution.

#![allow(dead_code)]

use batchlens_core::domain::datasource::{DataSourceConfig, DatabaseKind};
use batchlens_engine::{BatchMonitor, EngineConfig, MemoryConfigStore};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;
use tempfile::TempDir;

pub const DATA_SOURCE_ID: &str = "fixture";

pub const TOTAL_READ: i64 = 265;
pub const TOTAL_WRITTEN: i64 = 250;
pub const TOTAL_SKIPPED: i64 = 11;

const SCHEMA: &[&str] = &[
    "CREATE TABLE BATCH_JOB_INSTANCE (
        JOB_INSTANCE_ID BIGINT NOT NULL PRIMARY KEY,
        VERSION BIGINT,
        JOB_NAME VARCHAR(100) NOT NULL,
        JOB_KEY VARCHAR(32) NOT NULL
    )",
    "CREATE TABLE BATCH_JOB_EXECUTION (
        JOB_EXECUTION_ID BIGINT NOT NULL PRIMARY KEY,
        VERSION BIGINT,
        JOB_INSTANCE_ID BIGINT NOT NULL,
        CREATE_TIME TIMESTAMP NOT NULL,
        START_TIME TIMESTAMP DEFAULT NULL,
        END_TIME TIMESTAMP DEFAULT NULL,
        STATUS VARCHAR(10),
        EXIT_CODE VARCHAR(2500),
        EXIT_MESSAGE VARCHAR(2500),
        LAST_UPDATED TIMESTAMP
    )",
    "CREATE TABLE BATCH_STEP_EXECUTION (
        STEP_EXECUTION_ID BIGINT NOT NULL PRIMARY KEY,
        VERSION BIGINT NOT NULL,
        STEP_NAME VARCHAR(100) NOT NULL,
        JOB_EXECUTION_ID BIGINT NOT NULL,
        START_TIME TIMESTAMP DEFAULT NULL,
        END_TIME TIMESTAMP DEFAULT NULL,
        STATUS VARCHAR(10),
        COMMIT_COUNT BIGINT,
        READ_COUNT BIGINT,
        FILTER_COUNT BIGINT,
        WRITE_COUNT BIGINT,
        READ_SKIP_COUNT BIGINT,
        WRITE_SKIP_COUNT BIGINT,
        PROCESS_SKIP_COUNT BIGINT,
        ROLLBACK_COUNT BIGINT,
        EXIT_CODE VARCHAR(2500),
        EXIT_MESSAGE VARCHAR(2500),
        LAST_UPDATED TIMESTAMP
    )",
    "CREATE TABLE BATCH_JOB_EXECUTION_PARAMS (
        JOB_EXECUTION_ID BIGINT NOT NULL,
        TYPE_CD VARCHAR(6) NOT NULL,
        KEY_NAME VARCHAR(100) NOT NULL,
        STRING_VAL VARCHAR(250),
        DATE_VAL TIMESTAMP DEFAULT NULL,
        LONG_VAL BIGINT,
        DOUBLE_VAL DOUBLE PRECISION,
        IDENTIFYING CHAR(1) NOT NULL
    )",
    "CREATE TABLE customers (ID BIGINT NOT NULL PRIMARY KEY, NAME VARCHAR(100))",
];

const DATA: &[&str] = &[
    "INSERT INTO BATCH_JOB_INSTANCE VALUES
        (1, 0, 'importJob', 'k1'),
        (2, 0, 'exportJob', 'k2'),
        (3, 0, 'importJob', 'k3')",
    "INSERT INTO BATCH_JOB_EXECUTION VALUES
        (1, 2, 1, '2024-01-10 07:59:58', '2024-01-10 08:00:00', '2024-01-10 08:05:30',
         'COMPLETED', 'COMPLETED', '', '2024-01-10 08:05:30'),
        (2, 2, 2, '2024-01-11 08:59:58', '2024-01-11 09:00:00', '2024-01-11 09:01:00',
         'FAILED', 'FAILED', 'Connection timeout while writing', '2024-01-11 09:01:00'),
        (3, 1, 3, '2024-01-12 09:59:58', '2024-01-12 10:00:00', NULL,
         'STARTED', 'UNKNOWN', NULL, '2024-01-12 10:00:00')",
    "INSERT INTO BATCH_STEP_EXECUTION
        (STEP_EXECUTION_ID, VERSION, STEP_NAME, JOB_EXECUTION_ID, START_TIME, END_TIME, STATUS,
         COMMIT_COUNT, READ_COUNT, FILTER_COUNT, WRITE_COUNT, READ_SKIP_COUNT, WRITE_SKIP_COUNT,
         PROCESS_SKIP_COUNT, ROLLBACK_COUNT, EXIT_CODE, EXIT_MESSAGE)
     VALUES
        (1, 3, 'readStep', 1, '2024-01-10 08:00:00', '2024-01-10 08:02:00', 'COMPLETED',
         10, 100, 0, 95, 2, 2, 1, 0, 'COMPLETED', ''),
        (2, 3, 'writeStep', 1, '2024-01-10 08:02:00', '2024-01-10 08:05:30', 'COMPLETED',
         10, 95, 0, 95, 0, 0, 0, 0, 'COMPLETED', ''),
        (3, 3, 'readStep', 2, '2024-01-11 09:00:00', '2024-01-11 09:00:30', 'COMPLETED',
         5, 50, 0, 50, 1, 0, 0, 0, 'COMPLETED', ''),
        (4, 3, 'writeStep', 2, '2024-01-11 09:00:30', '2024-01-11 09:01:00', 'FAILED',
         1, 0, 0, 10, 0, 3, 0, 1, 'FAILED', 'Connection timeout while writing'),
        (5, 1, 'readStep', 3, '2024-01-12 10:00:00', NULL, 'STARTED',
         0, 20, 1, 0, 0, 0, 2, 0, 'EXECUTING', NULL)",
    "INSERT INTO BATCH_JOB_EXECUTION_PARAMS VALUES
        (1, 'LONG', 'run.id', NULL, NULL, 1, NULL, 'Y'),
        (1, 'STRING', 'input.file', 'data.csv', NULL, NULL, NULL, 'Y'),
        (1, 'DATE', 'run.date', NULL, '2024-01-10 00:00:00', NULL, NULL, 'N'),
        (1, 'DOUBLE', 'threshold', NULL, NULL, NULL, 0.5, 'N')",
];

/// Seeded database file; removed when dropped
pub struct Fixture {
    dir: TempDir,
    url: String,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.db");

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        for statement in SCHEMA.iter().chain(DATA.iter()) {
            sqlx::query(statement).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();

        let url = format!("sqlite://{}", path.display());
        Self { dir, url }
    }

    pub fn config(&self) -> DataSourceConfig {
        DataSourceConfig::new(
            DATA_SOURCE_ID,
            "Fixture",
            DatabaseKind::Sqlite,
            self.url.clone(),
            "",
            "",
        )
    }

    /// Path inside the fixture directory that does not exist
    pub fn missing_url(&self) -> String {
        format!("sqlite://{}", self.dir.path().join("missing.db").display())
    }
}

/// Monitor with an in-memory store and the fixture registered
pub async fn monitor() -> (BatchMonitor, Fixture) {
    let fixture = Fixture::new().await;
    let store = Arc::new(MemoryConfigStore::with_payload("[]"));
    let monitor = BatchMonitor::new(store, &EngineConfig::default());
    monitor.registry().add(fixture.config()).unwrap();
    (monitor, fixture)
}

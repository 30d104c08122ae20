//! Step execution domain types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::job::format_duration;

/// One run of a named step within a job execution, with its I/O counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecution {
    pub id: i64,
    pub job_execution_id: i64,
    pub step_name: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub exit_code: Option<String>,
    pub exit_message: Option<String>,
    pub read_count: i64,
    pub write_count: i64,
    pub commit_count: i64,
    pub rollback_count: i64,
    pub read_skip_count: i64,
    pub process_skip_count: i64,
    pub write_skip_count: i64,
    pub filter_count: i64,
}

impl StepExecution {
    pub fn formatted_duration(&self) -> String {
        format_duration(self.start_time, self.end_time)
    }

    /// Records skipped in any phase
    pub fn skip_count(&self) -> i64 {
        self.read_skip_count + self.process_skip_count + self.write_skip_count
    }
}

//! Search filters for job and step executions

use serde::{Deserialize, Serialize};

/// Optional constraints for a job execution search
///
/// Blank strings are treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExecutionFilter {
    /// Substring of the job name
    pub job_name: Option<String>,
    /// Exact status, e.g. `FAILED`
    pub status: Option<String>,
    /// Lower bound on start time, in any accepted date-time format
    pub start_date: Option<String>,
    /// Upper bound on end time, in any accepted date-time format
    pub end_date: Option<String>,
    /// Substring of the job name or the exit message
    pub keyword: Option<String>,
}

impl JobExecutionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_name(mut self, value: impl Into<String>) -> Self {
        self.job_name = Some(value.into());
        self
    }

    pub fn status(mut self, value: impl Into<String>) -> Self {
        self.status = Some(value.into());
        self
    }

    pub fn start_date(mut self, value: impl Into<String>) -> Self {
        self.start_date = Some(value.into());
        self
    }

    pub fn end_date(mut self, value: impl Into<String>) -> Self {
        self.end_date = Some(value.into());
        self
    }

    pub fn keyword(mut self, value: impl Into<String>) -> Self {
        self.keyword = Some(value.into());
        self
    }
}

/// Optional constraints for a step execution search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepExecutionFilter {
    /// Substring of the step name
    pub step_name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Parent job execution
    pub job_execution_id: Option<i64>,
}

impl StepExecutionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_name(mut self, value: impl Into<String>) -> Self {
        self.step_name = Some(value.into());
        self
    }

    pub fn status(mut self, value: impl Into<String>) -> Self {
        self.status = Some(value.into());
        self
    }

    pub fn start_date(mut self, value: impl Into<String>) -> Self {
        self.start_date = Some(value.into());
        self
    }

    pub fn end_date(mut self, value: impl Into<String>) -> Self {
        self.end_date = Some(value.into());
        self
    }

    pub fn job_execution_id(mut self, value: i64) -> Self {
        self.job_execution_id = Some(value);
        self
    }
}

/// Trimmed value of an optional filter field, or `None` when blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

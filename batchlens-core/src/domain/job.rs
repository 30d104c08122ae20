//! Job execution domain types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Label shown instead of a duration while an execution has no end time
pub const RUNNING_LABEL: &str = "running";

/// One run of a named batch job
///
/// Read-only snapshot of a `BATCH_JOB_EXECUTION` row joined with its
/// `BATCH_JOB_INSTANCE`. Times are the database's local wall-clock values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobExecution {
    pub id: i64,
    pub job_instance_id: i64,
    pub job_name: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub exit_code: Option<String>,
    pub exit_message: Option<String>,
    /// Only populated by single-execution lookups
    pub create_time: Option<NaiveDateTime>,
    pub last_updated: Option<NaiveDateTime>,
    pub version: Option<i64>,
}

impl JobExecution {
    pub fn formatted_duration(&self) -> String {
        format_duration(self.start_time, self.end_time)
    }

    pub fn is_running(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_none()
    }
}

/// One row of `BATCH_JOB_EXECUTION_PARAMS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParameter {
    pub key: String,
    pub value: ParameterValue,
    pub identifying: bool,
}

/// Typed parameter value, selected by the row's `TYPE_CD`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParameterValue {
    String(Option<String>),
    Date(Option<NaiveDateTime>),
    Long(Option<i64>),
    Double(Option<f64>),
    /// Type code not known to this monitor; the raw code is kept
    Other(String),
}

impl ParameterValue {
    pub fn type_code(&self) -> &str {
        match self {
            ParameterValue::String(_) => "STRING",
            ParameterValue::Date(_) => "DATE",
            ParameterValue::Long(_) => "LONG",
            ParameterValue::Double(_) => "DOUBLE",
            ParameterValue::Other(code) => code,
        }
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::String(v) => write!(f, "{}", v.as_deref().unwrap_or("")),
            ParameterValue::Date(v) => match v {
                Some(date) => write!(f, "{}", date.format("%Y-%m-%d %H:%M:%S")),
                None => Ok(()),
            },
            ParameterValue::Long(v) => write!(f, "{}", v.unwrap_or(0)),
            ParameterValue::Double(v) => write!(f, "{}", v.unwrap_or(0.0)),
            ParameterValue::Other(_) => Ok(()),
        }
    }
}

impl JobParameter {
    /// Value, type code and identifying marker, e.g. `2024-01-01 (STRING) [identifying]`
    pub fn display_value(&self) -> String {
        let mut rendered = format!("{} ({})", self.value, self.value.type_code());
        if self.identifying {
            rendered.push_str(" [identifying]");
        }
        rendered
    }
}

/// Render the elapsed time between two instants using its largest units
///
/// Empty when there is no start, [`RUNNING_LABEL`] when there is no end.
pub fn format_duration(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> String {
    let Some(start) = start else {
        return String::new();
    };
    let Some(end) = end else {
        return RUNNING_LABEL.to_string();
    };

    let seconds = (end - start).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(Some(at(10, 0, 0)), Some(at(10, 0, 42))), "42s");
        assert_eq!(format_duration(Some(at(10, 0, 0)), Some(at(10, 3, 5))), "3m 5s");
        assert_eq!(format_duration(Some(at(10, 0, 0)), Some(at(12, 15, 59))), "2h 15m");
    }

    #[test]
    fn test_format_duration_missing_bounds() {
        assert_eq!(format_duration(None, Some(at(1, 0, 0))), "");
        assert_eq!(format_duration(Some(at(1, 0, 0)), None), RUNNING_LABEL);
    }

    #[test]
    fn test_parameter_display_value() {
        let param = JobParameter {
            key: "run.id".to_string(),
            value: ParameterValue::Long(Some(7)),
            identifying: true,
        };
        assert_eq!(param.display_value(), "7 (LONG) [identifying]");

        let param = JobParameter {
            key: "input".to_string(),
            value: ParameterValue::String(Some("file.csv".to_string())),
            identifying: false,
        };
        assert_eq!(param.display_value(), "file.csv (STRING)");
    }
}

//! Aggregate statistics over one data source

use serde::{Deserialize, Serialize};

pub const TOTAL_JOBS: &str = "Total job executions";
pub const COMPLETED_JOBS: &str = "Completed jobs";
pub const FAILED_JOBS: &str = "Failed jobs";
pub const RUNNING_JOBS: &str = "Running jobs";
pub const TOTAL_STEPS: &str = "Total step executions";
pub const COMPLETED_STEPS: &str = "Completed steps";
pub const FAILED_STEPS: &str = "Failed steps";
pub const TOTAL_INSTANCES: &str = "Total job instances";
pub const DISTINCT_JOBS: &str = "Distinct job names";
pub const TOTAL_READ: &str = "Records read";
pub const TOTAL_WRITTEN: &str = "Records written";
pub const TOTAL_SKIPPED: &str = "Records skipped";

/// One labeled aggregate value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    pub label: String,
    pub value: i64,
    pub description: String,
}

/// Point-in-time set of aggregates computed over one connection
///
/// Produced in a single pass and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticSnapshot {
    pub data_source_id: String,
    pub collected_at: chrono::DateTime<chrono::Utc>,
    pub items: Vec<Statistic>,
}

impl StatisticSnapshot {
    pub fn new(data_source_id: impl Into<String>, items: Vec<Statistic>) -> Self {
        Self {
            data_source_id: data_source_id.into(),
            collected_at: chrono::Utc::now(),
            items,
        }
    }

    /// Value of the statistic with the given label
    pub fn value(&self, label: &str) -> Option<i64> {
        self.items
            .iter()
            .find(|item| item.label == label)
            .map(|item| item.value)
    }

    pub fn total_jobs(&self) -> i64 {
        self.value(TOTAL_JOBS).unwrap_or(0)
    }

    pub fn total_steps(&self) -> i64 {
        self.value(TOTAL_STEPS).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_label() {
        let snapshot = StatisticSnapshot::new(
            "ds",
            vec![Statistic {
                label: TOTAL_JOBS.to_string(),
                value: 3,
                description: "All job executions".to_string(),
            }],
        );
        assert_eq!(snapshot.total_jobs(), 3);
        assert_eq!(snapshot.value(FAILED_JOBS), None);
        assert_eq!(snapshot.total_steps(), 0);
    }
}

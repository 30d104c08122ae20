//! Statistics Service
//!
//! Computes a fixed sequence of aggregates over one connection. Any
//! failure aborts the whole snapshot; partial snapshots are never returned.

use batchlens_core::domain::datasource::DataSourceConfig;
use batchlens_core::domain::statistics::{self as labels, Statistic, StatisticSnapshot};
use std::sync::Arc;

use crate::db::{self, BatchConnection};
use crate::error::Result;
use crate::pool::PoolManager;
use crate::registry::DataSourceRegistry;
use crate::repository::statistics::{StepCounters, Table};
use crate::repository::statistics_repository;

#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    registry: Arc<DataSourceRegistry>,
    pools: Arc<PoolManager>,
}

impl StatisticsAggregator {
    pub fn new(registry: Arc<DataSourceRegistry>, pools: Arc<PoolManager>) -> Self {
        Self { registry, pools }
    }

    /// Snapshot of the database `config` points at
    ///
    /// The shared pool is used only when `config` matches its registry
    /// entry. Unregistered or edited configurations get a one-off pool
    /// that is closed afterwards, so the shared pools keep following the
    /// registry.
    pub async fn collect(&self, config: &DataSourceConfig) -> Result<StatisticSnapshot> {
        let registered = self
            .registry
            .get(&config.id)
            .is_some_and(|current| current.same_connection_settings(config));

        if registered {
            self.pools.ensure_pool(config).await?;
            let mut conn = self.pools.get_connection(&config.id).await?;
            return aggregate(&mut conn, &config.id).await;
        }

        tracing::debug!("Collecting statistics over a one-off pool for: {}", config.id);
        let pool = db::create_pool(config, self.pools.settings())?;
        let snapshot = async {
            let mut conn = pool.acquire().await?;
            aggregate(&mut conn, &config.id).await
        }
        .await;
        pool.close().await;
        snapshot
    }
}

async fn aggregate(conn: &mut BatchConnection, data_source_id: &str) -> Result<StatisticSnapshot> {
    let items = vec![
        stat(
            labels::TOTAL_JOBS,
            statistics_repository::count(conn, Table::JobExecution, None).await?,
            "Rows in BATCH_JOB_EXECUTION",
        ),
        stat(
            labels::COMPLETED_JOBS,
            statistics_repository::count(conn, Table::JobExecution, Some("COMPLETED")).await?,
            "Job executions with status COMPLETED",
        ),
        stat(
            labels::FAILED_JOBS,
            statistics_repository::count(conn, Table::JobExecution, Some("FAILED")).await?,
            "Job executions with status FAILED",
        ),
        stat(
            labels::RUNNING_JOBS,
            statistics_repository::count(conn, Table::JobExecution, Some("STARTED")).await?,
            "Job executions with status STARTED",
        ),
        stat(
            labels::TOTAL_STEPS,
            statistics_repository::count(conn, Table::StepExecution, None).await?,
            "Rows in BATCH_STEP_EXECUTION",
        ),
        stat(
            labels::COMPLETED_STEPS,
            statistics_repository::count(conn, Table::StepExecution, Some("COMPLETED")).await?,
            "Step executions with status COMPLETED",
        ),
        stat(
            labels::FAILED_STEPS,
            statistics_repository::count(conn, Table::StepExecution, Some("FAILED")).await?,
            "Step executions with status FAILED",
        ),
        stat(
            labels::TOTAL_INSTANCES,
            statistics_repository::count(conn, Table::JobInstance, None).await?,
            "Rows in BATCH_JOB_INSTANCE",
        ),
        stat(
            labels::DISTINCT_JOBS,
            statistics_repository::count_distinct_job_names(conn).await?,
            "Distinct job names across instances",
        ),
        stat(
            labels::TOTAL_READ,
            statistics_repository::sum_step_counters(conn, StepCounters::Read).await?,
            "Sum of READ_COUNT over all steps",
        ),
        stat(
            labels::TOTAL_WRITTEN,
            statistics_repository::sum_step_counters(conn, StepCounters::Written).await?,
            "Sum of WRITE_COUNT over all steps",
        ),
        stat(
            labels::TOTAL_SKIPPED,
            statistics_repository::sum_step_counters(conn, StepCounters::Skipped).await?,
            "Read, process and write skips over all steps",
        ),
    ];

    tracing::info!(
        "Collected {} statistics for data source: {}",
        items.len(),
        data_source_id
    );

    Ok(StatisticSnapshot::new(data_source_id.to_string(), items))
}

fn stat(label: &str, value: i64, description: &str) -> Statistic {
    Statistic {
        label: label.to_string(),
        value,
        description: description.to_string(),
    }
}

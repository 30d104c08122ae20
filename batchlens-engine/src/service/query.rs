//! Query Service
//!
//! Resolves a data source id through the registry, makes sure its pool
//! exists and runs one repository call on a connection scoped to the call.
//!
//! Reads against an id that is not registered return an empty result
//! rather than an error.

use batchlens_core::domain::job::{JobExecution, JobParameter};
use batchlens_core::domain::step::StepExecution;
use batchlens_core::dto::filter::{JobExecutionFilter, StepExecutionFilter};
use std::sync::Arc;

use crate::db::BatchConnection;
use crate::error::Result;
use crate::pool::PoolManager;
use crate::registry::DataSourceRegistry;
use crate::repository::{job_repository, metadata_repository, step_repository};

#[derive(Debug, Clone)]
pub struct QueryEngine {
    registry: Arc<DataSourceRegistry>,
    pools: Arc<PoolManager>,
}

impl QueryEngine {
    pub fn new(registry: Arc<DataSourceRegistry>, pools: Arc<PoolManager>) -> Self {
        Self { registry, pools }
    }

    /// Newest 100 job executions
    pub async fn list_recent_job_executions(&self, data_source_id: &str) -> Result<Vec<JobExecution>> {
        let Some(mut conn) = self.connect(data_source_id).await? else {
            return Ok(Vec::new());
        };

        Ok(job_repository::list_recent(&mut conn).await?)
    }

    /// Job executions matching `filter`, newest first, at most 500
    pub async fn search_job_executions(
        &self,
        data_source_id: &str,
        filter: &JobExecutionFilter,
    ) -> Result<Vec<JobExecution>> {
        let Some(mut conn) = self.connect(data_source_id).await? else {
            return Ok(Vec::new());
        };

        let executions = job_repository::search(&mut conn, filter).await?;
        tracing::debug!(
            "Job search on {} returned {} row(s)",
            data_source_id,
            executions.len()
        );
        Ok(executions)
    }

    /// One job execution with its bookkeeping columns
    pub async fn get_job_execution(
        &self,
        data_source_id: &str,
        job_execution_id: i64,
    ) -> Result<Option<JobExecution>> {
        let Some(mut conn) = self.connect(data_source_id).await? else {
            return Ok(None);
        };

        Ok(job_repository::find_by_id(&mut conn, job_execution_id).await?)
    }

    pub async fn list_job_parameters(
        &self,
        data_source_id: &str,
        job_execution_id: i64,
    ) -> Result<Vec<JobParameter>> {
        let Some(mut conn) = self.connect(data_source_id).await? else {
            return Ok(Vec::new());
        };

        Ok(job_repository::find_parameters(&mut conn, job_execution_id).await?)
    }

    /// Every step of one job execution, in start order
    pub async fn list_step_executions(
        &self,
        data_source_id: &str,
        job_execution_id: i64,
    ) -> Result<Vec<StepExecution>> {
        let Some(mut conn) = self.connect(data_source_id).await? else {
            return Ok(Vec::new());
        };

        Ok(step_repository::find_by_job_execution(&mut conn, job_execution_id).await?)
    }

    /// Step executions matching `filter`, newest first, at most 500
    pub async fn search_step_executions(
        &self,
        data_source_id: &str,
        filter: &StepExecutionFilter,
    ) -> Result<Vec<StepExecution>> {
        let Some(mut conn) = self.connect(data_source_id).await? else {
            return Ok(Vec::new());
        };

        let steps = step_repository::search(&mut conn, filter).await?;
        tracing::debug!(
            "Step search on {} returned {} row(s)",
            data_source_id,
            steps.len()
        );
        Ok(steps)
    }

    /// Batch metadata tables present in the data source
    pub async fn list_batch_tables(&self, data_source_id: &str) -> Result<Vec<String>> {
        let Some(mut conn) = self.connect(data_source_id).await? else {
            return Ok(Vec::new());
        };

        Ok(metadata_repository::list_batch_tables(&mut conn).await?)
    }

    /// Connection for a registered data source, or `None` if it is unknown
    async fn connect(&self, data_source_id: &str) -> Result<Option<BatchConnection>> {
        let Some(config) = self.registry.get(data_source_id) else {
            tracing::debug!("Data source not registered: {}", data_source_id);
            return Ok(None);
        };

        self.pools.ensure_pool(&config).await?;

        match self.pools.get_connection(data_source_id).await {
            Ok(conn) => Ok(Some(conn)),
            // removed between ensure and acquire
            Err(e) if e.is_not_configured() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

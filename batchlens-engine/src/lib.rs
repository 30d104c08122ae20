//! Batchlens engine
//!
//! Multi-data-source query and aggregation over batch job metadata:
//! the data source registry and its persistence, per-data-source
//! connection pools, filtered job/step queries and statistics.
//!
//! [`BatchMonitor`] wires the components together; each can also be
//! constructed on its own.

pub mod config;
pub mod db;
pub mod error;
pub mod pool;
pub mod query;
pub mod registry;
pub mod repository;
pub mod service;
pub mod store;

use batchlens_core::domain::statistics::StatisticSnapshot;
use std::collections::HashSet;
use std::sync::Arc;

pub use config::{EngineConfig, PoolSettings};
pub use error::{EngineError, RegistryError, StoreError};
pub use pool::PoolManager;
pub use registry::{DataSourceRegistry, SubscriptionId};
pub use service::{QueryEngine, StatisticsAggregator};
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};

/// Registry, pools, query engine and statistics sharing one configuration
#[derive(Debug, Clone)]
pub struct BatchMonitor {
    registry: Arc<DataSourceRegistry>,
    pools: Arc<PoolManager>,
    queries: QueryEngine,
    statistics: StatisticsAggregator,
}

impl BatchMonitor {
    /// Build from an explicit store
    pub fn new(store: Arc<dyn ConfigStore>, config: &EngineConfig) -> Self {
        let registry = Arc::new(DataSourceRegistry::new(store));
        let pools = Arc::new(PoolManager::new(config.pool, config.liveness_timeout));

        Self {
            queries: QueryEngine::new(registry.clone(), pools.clone()),
            statistics: StatisticsAggregator::new(registry.clone(), pools.clone()),
            registry,
            pools,
        }
    }

    /// Build with a file store at `config.store_path`
    pub fn open(config: &EngineConfig) -> anyhow::Result<Self> {
        config.validate()?;
        tracing::info!("Data source store: {}", config.store_path.display());

        let store = Arc::new(FileConfigStore::new(config.store_path.clone()));
        Ok(Self::new(store, config))
    }

    pub fn registry(&self) -> &DataSourceRegistry {
        &self.registry
    }

    pub fn pools(&self) -> &PoolManager {
        &self.pools
    }

    pub fn queries(&self) -> &QueryEngine {
        &self.queries
    }

    pub fn statistics(&self) -> &StatisticsAggregator {
        &self.statistics
    }

    /// Unregister a data source and close its pool
    pub async fn remove_data_source(&self, id: &str) -> bool {
        let removed = self.registry.remove(id);
        self.pools.remove_pool(id).await;
        removed
    }

    /// Replace every data source and close pools of ids that disappeared
    pub async fn import_data_sources(&self, payload: &str) -> Result<usize, RegistryError> {
        let count = self.registry.import_all(payload)?;
        self.sync_pools().await;
        Ok(count)
    }

    /// Unregister every data source and close every pool
    pub async fn clear_data_sources(&self) {
        self.registry.clear_all();
        self.pools.close_all().await;
    }

    /// Statistics for a registered data source; `None` if it is unknown
    pub async fn collect_statistics(&self, id: &str) -> error::Result<Option<StatisticSnapshot>> {
        let Some(config) = self.registry.get(id) else {
            return Ok(None);
        };

        self.statistics.collect(&config).await.map(Some)
    }

    /// Close pools of ids no longer present in the registry
    pub async fn sync_pools(&self) {
        let ids: HashSet<String> = self.registry.list_all().into_iter().map(|c| c.id).collect();
        self.pools.retain(&ids).await;
    }

    pub async fn shutdown(&self) {
        self.pools.close_all().await;
    }
}

//! Connection Pool Manager
//!
//! One lazily connecting pool per data source id. Pools are created on
//! first use from the registry's current configuration and replaced when
//! that configuration's connection settings change.

use batchlens_core::domain::datasource::DataSourceConfig;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::config::{MAX_LIVENESS_TIMEOUT, PoolSettings};
use crate::db::{self, BatchConnection, BatchPool};
use crate::error::{EngineError, Result};

struct PoolEntry {
    config: DataSourceConfig,
    pool: BatchPool,
}

pub struct PoolManager {
    settings: PoolSettings,
    liveness_timeout: Duration,
    pools: Mutex<HashMap<String, PoolEntry>>,
}

impl PoolManager {
    pub fn new(settings: PoolSettings, liveness_timeout: Duration) -> Self {
        Self {
            settings,
            liveness_timeout: liveness_timeout.min(MAX_LIVENESS_TIMEOUT),
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Make sure a pool matching `config` exists for its id
    ///
    /// Creation happens under the map lock without awaiting, so concurrent
    /// first uses of the same id create exactly one pool. A pool built from
    /// different connection settings is replaced and closed.
    pub async fn ensure_pool(&self, config: &DataSourceConfig) -> Result<BatchPool> {
        let (pool, replaced) = {
            let mut pools = self.pools.lock();

            if let Some(entry) = pools.get(&config.id) {
                if entry.config.same_connection_settings(config) && !entry.pool.is_closed() {
                    return Ok(entry.pool.clone());
                }
            }

            let pool = db::create_pool(config, &self.settings)?;
            let replaced = pools.insert(
                config.id.clone(),
                PoolEntry {
                    config: config.clone(),
                    pool: pool.clone(),
                },
            );
            (pool, replaced)
        };

        match replaced {
            Some(old) => {
                tracing::info!("Connection pool replaced for data source: {}", config.id);
                old.pool.close().await;
            }
            None => {
                tracing::info!(
                    "Connection pool created for data source: {} ({})",
                    config.id,
                    config.kind
                );
            }
        }

        Ok(pool)
    }

    /// Check out a connection from the pool registered under `id`
    ///
    /// The connection goes back to the pool when dropped.
    pub async fn get_connection(&self, id: &str) -> Result<BatchConnection> {
        let pool = self
            .pools
            .lock()
            .get(id)
            .map(|entry| entry.pool.clone())
            .ok_or_else(|| EngineError::NotConfigured(id.to_string()))?;

        pool.acquire().await
    }

    /// Close and forget the pool for `id`; absent ids are ignored
    pub async fn remove_pool(&self, id: &str) {
        let removed = self.pools.lock().remove(id);

        if let Some(entry) = removed {
            entry.pool.close().await;
            tracing::info!("Connection pool removed for data source: {}", id);
        }
    }

    /// Close every pool whose id is not in `ids`
    pub async fn retain(&self, ids: &HashSet<String>) {
        let stale: Vec<String> = self
            .pools
            .lock()
            .keys()
            .filter(|id| !ids.contains(*id))
            .cloned()
            .collect();

        for id in stale {
            self.remove_pool(&id).await;
        }
    }

    pub async fn close_all(&self) {
        let entries: Vec<(String, PoolEntry)> = self.pools.lock().drain().collect();

        for (id, entry) in entries {
            entry.pool.close().await;
            tracing::debug!("Connection pool closed for data source: {}", id);
        }
        tracing::info!("All connection pools closed");
    }

    /// Ids that currently have a pool, sorted
    pub fn pool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pools.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_pool(&self, id: &str) -> bool {
        self.pools.lock().contains_key(id)
    }

    /// Open a single unpooled connection with `config` and ping it
    ///
    /// Never fails: any error or timeout yields `false`.
    pub async fn test_connection(&self, config: &DataSourceConfig) -> bool {
        match tokio::time::timeout(self.liveness_timeout, db::ping(config)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!("Connection test failed for {}: {}", config.id, e);
                false
            }
            Err(_) => {
                tracing::debug!(
                    "Connection test timed out for {} after {:?}",
                    config.id,
                    self.liveness_timeout
                );
                false
            }
        }
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new(PoolSettings::default(), MAX_LIVENESS_TIMEOUT)
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("settings", &self.settings)
            .field("pools", &self.pool_ids())
            .finish()
    }
}

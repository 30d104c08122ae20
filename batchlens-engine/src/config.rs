//! Engine configuration
//!
//! Defines where data source configurations are persisted and how the
//! per-data-source connection pools are sized and timed out.

use std::path::PathBuf;
use std::time::Duration;

/// Hard ceiling for connection liveness checks
pub const MAX_LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Sizing and timeout ceilings applied to every connection pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_idle: u32,
    /// How long to wait for a connection before failing
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_idle: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PoolSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            anyhow::bail!("max_connections must be greater than 0");
        }

        if self.min_idle > self.max_connections {
            anyhow::bail!(
                "min_idle ({}) cannot exceed max_connections ({})",
                self.min_idle,
                self.max_connections
            );
        }

        if self.connect_timeout.is_zero()
            || self.idle_timeout.is_zero()
            || self.max_lifetime.is_zero()
        {
            anyhow::bail!("pool timeouts must be greater than 0");
        }

        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// JSON file holding the registered data sources
    pub store_path: PathBuf,

    pub pool: PoolSettings,

    /// Bound on a single liveness check, never above [`MAX_LIVENESS_TIMEOUT`]
    pub liveness_timeout: Duration,
}

impl EngineConfig {
    /// Creates a new configuration with defaults
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            store_path,
            pool: PoolSettings::default(),
            liveness_timeout: MAX_LIVENESS_TIMEOUT,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - BATCHLENS_CONFIG (path, default: ~/.batchlens/datasources.json)
    /// - BATCHLENS_POOL_MAX (default: 5)
    /// - BATCHLENS_POOL_MIN_IDLE (default: 1)
    /// - BATCHLENS_CONNECT_TIMEOUT (seconds, default: 30)
    /// - BATCHLENS_IDLE_TIMEOUT (seconds, default: 600)
    /// - BATCHLENS_MAX_LIFETIME (seconds, default: 1800)
    /// - BATCHLENS_LIVENESS_TIMEOUT (seconds, default and maximum: 5)
    pub fn from_env() -> anyhow::Result<Self> {
        let store_path = std::env::var("BATCHLENS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_store_path());

        let defaults = PoolSettings::default();

        let pool = PoolSettings {
            max_connections: env_parse("BATCHLENS_POOL_MAX")?.unwrap_or(defaults.max_connections),
            min_idle: env_parse("BATCHLENS_POOL_MIN_IDLE")?.unwrap_or(defaults.min_idle),
            connect_timeout: env_parse("BATCHLENS_CONNECT_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            idle_timeout: env_parse("BATCHLENS_IDLE_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            max_lifetime: env_parse("BATCHLENS_MAX_LIFETIME")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_lifetime),
        };

        let liveness_timeout = env_parse("BATCHLENS_LIVENESS_TIMEOUT")?
            .map(Duration::from_secs)
            .unwrap_or(MAX_LIVENESS_TIMEOUT)
            .min(MAX_LIVENESS_TIMEOUT);

        Ok(Self {
            store_path,
            pool,
            liveness_timeout,
        })
    }

    pub fn with_store_path(mut self, store_path: PathBuf) -> Self {
        self.store_path = store_path;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store_path.as_os_str().is_empty() {
            anyhow::bail!("store_path cannot be empty");
        }

        if self.liveness_timeout.is_zero() {
            anyhow::bail!("liveness_timeout must be greater than 0");
        }

        if self.liveness_timeout > MAX_LIVENESS_TIMEOUT {
            anyhow::bail!(
                "liveness_timeout cannot exceed {} seconds",
                MAX_LIVENESS_TIMEOUT.as_secs()
            );
        }

        self.pool.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(default_store_path())
    }
}

fn default_store_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".batchlens").join("datasources.json"),
        None => PathBuf::from("batchlens-datasources.json"),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", key, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.pool.max_connections, 5);
        assert_eq!(config.pool.min_idle, 1);
        assert_eq!(config.pool.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.liveness_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::new(PathBuf::from("/tmp/ds.json"));
        assert!(config.validate().is_ok());

        config.pool.min_idle = 10;
        assert!(config.validate().is_err());
        config.pool.min_idle = 1;

        config.pool.max_connections = 0;
        assert!(config.validate().is_err());
        config.pool.max_connections = 5;

        config.liveness_timeout = Duration::from_secs(30);
        assert!(config.validate().is_err());
        config.liveness_timeout = Duration::from_secs(2);
        assert!(config.validate().is_ok());

        config.store_path = PathBuf::new();
        assert!(config.validate().is_err());
    }
}

//! Configuration module
//!
//! Resolves the engine configuration from the environment and CLI flags.

use anyhow::{Context, Result};
use batchlens_engine::{BatchMonitor, EngineConfig};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Overrides the store path from the environment
    pub store_path: Option<PathBuf>,

    /// Data source id used by query commands
    pub source: String,
}

impl Config {
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let engine = EngineConfig::from_env().context("Invalid engine configuration")?;

        Ok(match &self.store_path {
            Some(path) => engine.with_store_path(path.clone()),
            None => engine,
        })
    }

    /// Open the monitor over the configured store
    pub fn open_monitor(&self) -> Result<BatchMonitor> {
        let engine = self.engine_config()?;
        BatchMonitor::open(&engine).context("Failed to open data source store")
    }
}

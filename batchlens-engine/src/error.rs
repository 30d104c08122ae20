//! Error types for the engine

use thiserror::Error;

/// Result type alias for query and pool operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by registry mutations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A configuration with this id is already registered
    #[error("Data source with ID '{0}' already exists")]
    DuplicateId(String),

    /// No configuration with this id is registered
    #[error("Data source with ID '{0}' not found")]
    NotFound(String),

    /// Import payload could not be parsed
    #[error("Failed to import configurations: {0}")]
    Import(#[source] serde_json::Error),

    /// Configurations could not be serialized
    #[error("Failed to export configurations: {0}")]
    Export(#[source] serde_json::Error),
}

/// Errors raised by a configuration store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while talking to a monitored database
#[derive(Debug, Error)]
pub enum EngineError {
    /// No pool exists for the data source id
    #[error("No connection pool configured for data source '{0}'")]
    NotConfigured(String),

    /// The configuration names a driver this build cannot connect with
    #[error("Unsupported database driver '{0}'")]
    UnsupportedDriver(String),

    /// Opening or acquiring a connection failed
    #[error("Connection failure: {0}")]
    Connection(#[source] sqlx::Error),

    /// A statement failed or a row could not be mapped
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl EngineError {
    /// Check if this error means the data source has no pool
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

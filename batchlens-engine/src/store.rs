//! Configuration persistence
//!
//! The registry only needs to load and save one serialized blob. Stores
//! are trait-based so the registry can be embedded with any backing.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Load/save contract for the serialized data source list
pub trait ConfigStore: Send + Sync {
    /// Returns the last saved payload, or `None` if nothing was saved yet
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replaces the saved payload
    fn save(&self, payload: &str) -> Result<(), StoreError>;
}

/// JSON file on local disk
///
/// Saves write a sibling temp file and rename it over the target, so a
/// reader never observes a half-written payload.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "datasources.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, payload: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        std::fs::write(&temp, payload)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// In-memory store, for tests and embedding without persistence
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    payload: Mutex<Option<String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a payload
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Mutex::new(Some(payload.into())),
        }
    }

    /// Current saved payload
    pub fn payload(&self) -> Option<String> {
        self.payload.lock().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.payload.lock().clone())
    }

    fn save(&self, payload: &str) -> Result<(), StoreError> {
        *self.payload.lock() = Some(payload.to_string());
        Ok(())
    }
}

//! Data Source Registry
//!
//! Holds the named connection configurations, persists them through a
//! [`ConfigStore`] and notifies subscribers after every change.
//!
//! Readers always get a stable snapshot: the list lives behind an `Arc`
//! that writers swap out, so iteration never blocks a writer and never
//! observes a half-applied change. Writers are serialized so that the
//! persisted payload always matches the latest in-memory list.

use batchlens_core::domain::datasource::{DataSourceConfig, DatabaseKind};
use parking_lot::{Mutex, RwLock};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::error::RegistryError;
use crate::store::ConfigStore;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Id of the configuration seeded into an empty registry
pub const DEFAULT_DATA_SOURCE_ID: &str = "default-sqlite";

/// Callback invoked with the full list after every change
pub type Subscriber = Arc<dyn Fn(&[DataSourceConfig]) + Send + Sync>;

/// Handle returned by [`DataSourceRegistry::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct DataSourceRegistry {
    store: Arc<dyn ConfigStore>,
    configs: RwLock<Arc<Vec<DataSourceConfig>>>,
    write_lock: Mutex<()>,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl DataSourceRegistry {
    /// Load the registry from `store`
    ///
    /// An empty or unreadable store yields a registry holding only the
    /// default configuration, which is then persisted.
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        let mut configs = load_configs(store.as_ref());
        let seeded = configs.is_empty();
        if seeded {
            configs.push(default_config());
        }

        let registry = Self {
            store,
            configs: RwLock::new(Arc::new(configs)),
            write_lock: Mutex::new(()),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        };

        if seeded {
            tracing::info!("Seeded default data source: {}", DEFAULT_DATA_SOURCE_ID);
            registry.persist(&registry.snapshot());
        }

        registry
    }

    /// Current list; unaffected by later changes
    pub fn snapshot(&self) -> Arc<Vec<DataSourceConfig>> {
        self.configs.read().clone()
    }

    pub fn list_all(&self) -> Vec<DataSourceConfig> {
        self.snapshot().as_ref().clone()
    }

    pub fn list_active(&self) -> Vec<DataSourceConfig> {
        self.snapshot().iter().filter(|c| c.active).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<DataSourceConfig> {
        self.snapshot().iter().find(|c| c.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().iter().any(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Register a new configuration, assigning an id if it has none
    ///
    /// Returns the stored configuration.
    pub fn add(&self, mut config: DataSourceConfig) -> Result<DataSourceConfig> {
        if config.id.trim().is_empty() {
            config.id = Uuid::new_v4().to_string();
        }

        self.mutate(|configs| {
            if configs.iter().any(|c| c.id == config.id) {
                return Err(RegistryError::DuplicateId(config.id.clone()));
            }
            configs.push(config.clone());
            Ok(Some(()))
        })?;

        tracing::info!("Data source added: {} ({})", config.id, config.kind);
        Ok(config)
    }

    /// Replace the configuration with the same id
    pub fn update(&self, config: DataSourceConfig) -> Result<()> {
        let id = config.id.clone();
        self.mutate(|configs| {
            let slot = configs
                .iter_mut()
                .find(|c| c.id == config.id)
                .ok_or_else(|| RegistryError::NotFound(config.id.clone()))?;
            *slot = config;
            Ok(Some(()))
        })?;

        tracing::info!("Data source updated: {}", id);
        Ok(())
    }

    /// Remove a configuration; returns whether anything was removed
    pub fn remove(&self, id: &str) -> bool {
        let removed = self
            .mutate(|configs| {
                let before = configs.len();
                configs.retain(|c| c.id != id);
                Ok((configs.len() != before).then_some(()))
            })
            .map(|changed| changed.is_some())
            .unwrap_or(false);

        if removed {
            tracing::info!("Data source removed: {}", id);
        }
        removed
    }

    pub fn set_active(&self, id: &str, active: bool) -> Result<()> {
        self.mutate(|configs| {
            let config = configs
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            config.active = active;
            Ok(Some(()))
        })?;

        tracing::info!("Data source {} active={}", id, active);
        Ok(())
    }

    /// Serialize every configuration, credentials included
    pub fn export_all(&self) -> Result<String> {
        serde_json::to_string_pretty(self.snapshot().as_ref()).map_err(RegistryError::Export)
    }

    /// Replace the whole list with the payload's configurations
    ///
    /// Blank ids are assigned; duplicate ids reject the payload. On error
    /// the registry is unchanged.
    pub fn import_all(&self, payload: &str) -> Result<usize> {
        let mut imported: Vec<DataSourceConfig> =
            serde_json::from_str(payload).map_err(RegistryError::Import)?;

        for config in imported.iter_mut() {
            if config.id.trim().is_empty() {
                config.id = Uuid::new_v4().to_string();
            }
        }
        for (i, config) in imported.iter().enumerate() {
            if imported[..i].iter().any(|c| c.id == config.id) {
                return Err(RegistryError::DuplicateId(config.id.clone()));
            }
        }

        let count = imported.len();
        self.mutate(|configs| {
            *configs = imported;
            Ok(Some(()))
        })?;

        tracing::info!("Imported {} data source(s)", count);
        Ok(count)
    }

    pub fn clear_all(&self) {
        // clearing cannot fail
        let _ = self.mutate(|configs| {
            configs.clear();
            Ok(Some(()))
        });
        tracing::info!("All data sources cleared");
    }

    /// Register a change callback
    ///
    /// Callbacks run synchronously on the mutating thread, after the
    /// change has been persisted, and see snapshots in mutation order. A
    /// panicking callback is logged and does not affect the others.
    ///
    /// Callbacks run while writers are held off: they may read the
    /// registry but must not mutate it, or the calling thread deadlocks.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&[DataSourceConfig]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Apply `change` to a copy of the list, then publish, persist and notify
    ///
    /// The whole sequence runs under the writer lock, so concurrent
    /// mutations persist and notify in the order they were applied.
    ///
    /// `change` returns `Ok(None)` when it left the list untouched, in
    /// which case nothing is persisted or announced.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<DataSourceConfig>) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let _writer = self.write_lock.lock();

        let mut next = self.snapshot().as_ref().clone();
        let Some(output) = change(&mut next)? else {
            return Ok(None);
        };

        let next = Arc::new(next);
        *self.configs.write() = next.clone();
        self.persist(&next);
        // still under the writer lock so deliveries follow mutation order
        self.notify(&next);
        Ok(Some(output))
    }

    fn persist(&self, configs: &[DataSourceConfig]) {
        let payload = match serde_json::to_string_pretty(configs) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to serialize data sources: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.save(&payload) {
            tracing::warn!("Failed to persist data sources: {}", e);
        }
    }

    fn notify(&self, configs: &[DataSourceConfig]) {
        let subscribers = self.subscribers.read().clone();

        for (id, subscriber) in subscribers {
            if catch_unwind(AssertUnwindSafe(|| subscriber(configs))).is_err() {
                tracing::warn!("Data source subscriber {:?} panicked", id);
            }
        }
    }
}

impl std::fmt::Debug for DataSourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceRegistry")
            .field("configs", &self.snapshot().len())
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

fn load_configs(store: &dyn ConfigStore) -> Vec<DataSourceConfig> {
    let payload = match store.load() {
        Ok(Some(payload)) if !payload.trim().is_empty() => payload,
        Ok(_) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to load data sources: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<DataSourceConfig>>(&payload) {
        Ok(mut configs) => {
            for config in configs.iter_mut() {
                if config.id.trim().is_empty() {
                    config.id = Uuid::new_v4().to_string();
                }
            }
            configs
        }
        Err(e) => {
            tracing::warn!("Stored data sources are unreadable: {}", e);
            Vec::new()
        }
    }
}

fn default_config() -> DataSourceConfig {
    DataSourceConfig::new(
        DEFAULT_DATA_SOURCE_ID,
        "Default SQLite Database",
        DatabaseKind::Sqlite,
        "sqlite::memory:",
        "",
        "",
    )
    .with_description("Default in-memory SQLite database for testing")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryConfigStore;
    use std::sync::atomic::AtomicUsize;

    struct FailingStore;

    impl ConfigStore for FailingStore {
        fn load(&self) -> std::result::Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn save(&self, _payload: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    fn config(id: &str) -> DataSourceConfig {
        DataSourceConfig::new(
            id,
            format!("Source {}", id),
            DatabaseKind::PostgreSql,
            "postgres://localhost:5432/batch",
            "batch",
            "secret",
        )
    }

    fn empty_registry() -> (DataSourceRegistry, Arc<MemoryConfigStore>) {
        let store = Arc::new(MemoryConfigStore::with_payload("[]"));
        let registry = DataSourceRegistry::new(store.clone());
        registry.clear_all();
        (registry, store)
    }

    #[test]
    fn test_seeds_default_when_store_empty() {
        let store = Arc::new(MemoryConfigStore::new());
        let registry = DataSourceRegistry::new(store.clone());

        assert_eq!(registry.len(), 1);
        assert!(registry.get(DEFAULT_DATA_SOURCE_ID).is_some());
        assert!(store.payload().unwrap().contains(DEFAULT_DATA_SOURCE_ID));
    }

    #[test]
    fn test_seeds_default_when_store_unreadable() {
        let registry = DataSourceRegistry::new(Arc::new(MemoryConfigStore::with_payload("{not json")));
        assert_eq!(registry.list_all().len(), 1);

        let registry = DataSourceRegistry::new(Arc::new(FailingStore));
        assert!(registry.contains(DEFAULT_DATA_SOURCE_ID));
    }

    #[test]
    fn test_loads_persisted_configs() {
        let payload = serde_json::to_string(&vec![config("a"), config("b")]).unwrap();
        let registry = DataSourceRegistry::new(Arc::new(MemoryConfigStore::with_payload(payload)));

        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(DEFAULT_DATA_SOURCE_ID));
    }

    #[test]
    fn test_add_then_get_and_remove() {
        let (registry, store) = empty_registry();

        let added = registry.add(config("pg")).unwrap();
        assert_eq!(registry.get("pg"), Some(added));
        assert!(store.payload().unwrap().contains("\"pg\""));

        assert!(registry.remove("pg"));
        assert_eq!(registry.get("pg"), None);
        assert!(!registry.remove("pg"));
    }

    #[test]
    fn test_add_assigns_id_when_blank() {
        let (registry, _) = empty_registry();
        let added = registry.add(config("  ")).unwrap();

        assert!(Uuid::parse_str(&added.id).is_ok());
        assert!(registry.contains(&added.id));
    }

    #[test]
    fn test_duplicate_id_rejected_without_change() {
        let (registry, _) = empty_registry();
        registry.add(config("dup")).unwrap();
        let before = registry.list_all();

        let mut second = config("dup");
        second.name = "Other".to_string();
        let err = registry.add(second).unwrap_err();

        assert!(matches!(err, RegistryError::DuplicateId(id) if id == "dup"));
        assert_eq!(registry.list_all(), before);
    }

    #[test]
    fn test_update_and_set_active() {
        let (registry, _) = empty_registry();
        registry.add(config("a")).unwrap();

        let mut changed = config("a");
        changed.url = "postgres://db.internal:5432/batch".to_string();
        registry.update(changed.clone()).unwrap();
        assert_eq!(registry.get("a"), Some(changed));

        registry.set_active("a", false).unwrap();
        assert!(registry.list_active().is_empty());
        assert_eq!(registry.list_all().len(), 1);

        assert!(matches!(
            registry.update(config("missing")),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.set_active("missing", true),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let (source, _) = empty_registry();
        source.add(config("a")).unwrap();
        source.add(config("b").with_description("second")).unwrap();
        source.set_active("b", false).unwrap();
        let payload = source.export_all().unwrap();

        let (target, _) = empty_registry();
        assert_eq!(target.import_all(&payload).unwrap(), 2);
        assert_eq!(target.list_all(), source.list_all());
    }

    #[test]
    fn test_import_replaces_rather_than_merges() {
        let (registry, _) = empty_registry();
        registry.add(config("old")).unwrap();

        let payload = serde_json::to_string(&vec![config("new")]).unwrap();
        registry.import_all(&payload).unwrap();

        assert!(!registry.contains("old"));
        assert!(registry.contains("new"));
    }

    #[test]
    fn test_import_rejects_malformed_payload() {
        let (registry, _) = empty_registry();
        registry.add(config("keep")).unwrap();

        let err = registry.import_all("[{\"name\": 42}]").unwrap_err();
        assert!(matches!(err, RegistryError::Import(_)));
        assert!(registry.contains("keep"));
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let registry = DataSourceRegistry::new(Arc::new(FailingStore));
        registry.add(config("mem")).unwrap();
        assert!(registry.contains("mem"));
    }

    #[test]
    fn test_subscribers_notified_after_persist() {
        let store = Arc::new(MemoryConfigStore::with_payload("[]"));
        let registry = DataSourceRegistry::new(store.clone());

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = observed.clone();
        let store_view = store.clone();
        registry.subscribe(move |configs| {
            let persisted = store_view.payload().unwrap_or_default();
            sink.lock().push((configs.len(), persisted.contains("\"late\"")));
        });

        registry.add(config("late")).unwrap();
        registry.remove("late");

        let observed = observed.lock().clone();
        assert_eq!(observed, vec![(2, true), (1, false)]);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let (registry, store) = empty_registry();
        let calls = Arc::new(AtomicUsize::new(0));

        registry.subscribe(|_| panic!("subscriber failure"));
        let counter = calls.clone();
        registry.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.add(config("x")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.payload().unwrap().contains("\"x\""));
    }

    #[test]
    fn test_unsubscribe() {
        let (registry, _) = empty_registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let id = registry.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.add(config("one")).unwrap();
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.add(config("two")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slow_subscriber_sees_changes_in_order() {
        let (registry, _) = empty_registry();
        let registry = Arc::new(registry);

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = delivered.clone();
        registry.subscribe(move |configs| {
            if configs.len() == 1 {
                std::thread::sleep(std::time::Duration::from_millis(300));
            }
            sink.lock().push(configs.len());
        });

        let first = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry.add(config("a")).unwrap();
            })
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        let second = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry.add(config("b")).unwrap();
            })
        };
        first.join().unwrap();
        second.join().unwrap();

        assert_eq!(*delivered.lock(), vec![1, 2]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_subscriber_may_read_registry() {
        let (registry, _) = empty_registry();
        let registry = Arc::new(registry);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reader = Arc::downgrade(&registry);
        registry.subscribe(move |_| {
            if let Some(registry) = reader.upgrade() {
                sink.lock().push(registry.len());
            }
        });

        registry.add(config("a")).unwrap();
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() {
        let (registry, _) = empty_registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..5)
            .map(|worker| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for n in 0..10 {
                        registry.add(config(&format!("w{}-{}", worker, n))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ids: std::collections::HashSet<_> =
            registry.list_all().into_iter().map(|c| c.id).collect();
        assert_eq!(registry.len(), 50);
        assert_eq!(ids.len(), 50);
    }
}

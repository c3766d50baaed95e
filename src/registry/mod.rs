//! Query identifier registry
//!
//! Maps an unordered set of item ids to a stable integer that the downstream
//! aggregation engine keys its per-filter result views on. Ids are cached in
//! memory for the life of the registry and persisted through a [`QueryStore`]
//! so other processes sharing the store agree on them.
//!
//! Allocation uses no transactions. On a miss the registry
//! re-reads the store, then tries candidate ids from its own counter until it
//! finds a free one, then inserts. Two processes registering different new
//! keys at the same moment can still race between the free-id check and the insert.
//!
//! A miss must finish within the registry's timeout. The deadline covers the
//! wait for the write lock and every pass of the free-id search.

mod key;
mod store;

pub use key::QueryKey;
pub use store::{QueryStore, SqliteQueryStore};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::TypeId;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("query store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("failed to encode query key: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("timed out after {0:?} resolving query id")]
    Timeout(Duration),
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Highest id this registry has handed out or skipped past
    last_id: i64,
    queries: HashMap<String, i64>,
}

/// Default bound on a single miss
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct QueryRegistry<S> {
    store: S,
    state: RwLock<RegistryState>,
    timeout: Duration,
}

impl<S: QueryStore> QueryRegistry<S> {
    pub fn new(store: S) -> Self {
        Self::with_timeout(store, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(store: S, timeout: Duration) -> Self {
        Self {
            store,
            state: RwLock::new(RegistryState::default()),
            timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve an item set to its query id, registering it on first sight.
    pub fn resolve<I>(&self, items: I) -> Result<i64, RegistryError>
    where
        I: IntoIterator<Item = TypeId>,
    {
        let key = QueryKey::new(items)?;
        self.resolve_key(&key)
    }

    pub fn resolve_key(&self, key: &QueryKey) -> Result<i64, RegistryError> {
        if let Some(&id) = self.state.read().queries.get(key.as_str()) {
            return Ok(id);
        }

        let deadline = Instant::now() + self.timeout;
        // Held until the new id is inserted so misses are serialized.
        let mut state = self
            .state
            .try_write_until(deadline)
            .ok_or(RegistryError::Timeout(self.timeout))?;

        if let Some(id) = self.store.find_by_key(key)? {
            debug!(id, key = key.as_str(), "query id found in store");
            state.queries.insert(key.as_str().to_string(), id);
            return Ok(id);
        }

        state.last_id += 1;
        while self.store.contains_id(state.last_id)? {
            if Instant::now() >= deadline {
                return Err(RegistryError::Timeout(self.timeout));
            }
            debug!(id = state.last_id, "query id taken, trying next");
            state.last_id += 1;
        }

        let id = state.last_id;
        self.store.insert(id, key)?;
        info!(id, key = key.as_str(), "registered query");
        state.queries.insert(key.as_str().to_string(), id);
        Ok(id)
    }

    /// Number of keys cached in memory
    pub fn cached(&self) -> usize {
        self.state.read().queries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store that counts calls
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<BTreeMap<i64, String>>,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        fn with_rows(rows: &[(i64, &str)]) -> Self {
            let store = Self::default();
            store
                .rows
                .lock()
                .extend(rows.iter().map(|&(id, key)| (id, key.to_string())));
            store
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl QueryStore for MemoryStore {
        fn find_by_key(&self, key: &QueryKey) -> Result<Option<i64>, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows
                .lock()
                .iter()
                .find(|(_, k)| k.as_str() == key.as_str())
                .map(|(&id, _)| id))
        }

        fn contains_id(&self, id: i64) -> Result<bool, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().contains_key(&id))
        }

        fn insert(&self, id: i64, key: &QueryKey) -> Result<(), RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows.lock().insert(id, key.as_str().to_string());
            Ok(())
        }
    }

    /// Store whose every call fails
    struct BrokenStore;

    impl QueryStore for BrokenStore {
        fn find_by_key(&self, _key: &QueryKey) -> Result<Option<i64>, RegistryError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }

        fn contains_id(&self, _id: i64) -> Result<bool, RegistryError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }

        fn insert(&self, _id: i64, _key: &QueryKey) -> Result<(), RegistryError> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
    }

    /// Store that reports every id as taken
    struct FullStore;

    impl QueryStore for FullStore {
        fn find_by_key(&self, _key: &QueryKey) -> Result<Option<i64>, RegistryError> {
            Ok(None)
        }

        fn contains_id(&self, _id: i64) -> Result<bool, RegistryError> {
            Ok(true)
        }

        fn insert(&self, _id: i64, _key: &QueryKey) -> Result<(), RegistryError> {
            Ok(())
        }
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let registry = QueryRegistry::new(MemoryStore::default());
        assert_eq!(registry.resolve([587]).unwrap(), 1);
        assert_eq!(registry.resolve([587, 179]).unwrap(), 2);
        assert_eq!(registry.resolve([2873]).unwrap(), 3);
    }

    #[test]
    fn test_second_resolve_served_from_cache() {
        let registry = QueryRegistry::new(MemoryStore::default());
        let id = registry.resolve([3, 1, 2]).unwrap();
        let calls = registry.store().calls();

        assert_eq!(registry.resolve([2, 3, 1, 1]).unwrap(), id);
        assert_eq!(registry.store().calls(), calls);
        assert_eq!(registry.cached(), 1);
    }

    #[test]
    fn test_existing_key_reused_from_store() {
        let registry = QueryRegistry::new(MemoryStore::with_rows(&[(40, "[179,587]")]));
        assert_eq!(registry.resolve([587, 179]).unwrap(), 40);
        assert_eq!(registry.store().rows.lock().len(), 1);
    }

    #[test]
    fn test_taken_ids_are_skipped() {
        let registry = QueryRegistry::new(MemoryStore::with_rows(&[
            (1, "[10]"),
            (2, "[20]"),
            (4, "[40]"),
        ]));
        assert_eq!(registry.resolve([30]).unwrap(), 3);
        assert_eq!(registry.resolve([50]).unwrap(), 5);

        let rows = registry.store().rows.lock();
        assert_eq!(rows.get(&3).map(String::as_str), Some("[30]"));
        assert_eq!(rows.get(&5).map(String::as_str), Some("[50]"));
    }

    #[test]
    fn test_store_error_propagated() {
        let registry = QueryRegistry::new(BrokenStore);
        let err = registry.resolve([1]).unwrap_err();
        assert!(matches!(err, RegistryError::Store(rusqlite::Error::InvalidQuery)));
        assert_eq!(registry.cached(), 0);
    }

    #[test]
    fn test_id_search_stops_at_deadline() {
        let registry = QueryRegistry::with_timeout(FullStore, Duration::from_millis(20));
        let start = Instant::now();
        let err = registry.resolve([1]).unwrap_err();
        assert!(matches!(err, RegistryError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(registry.cached(), 0);
    }

    #[test]
    fn test_lock_wait_stops_at_deadline() {
        let registry =
            QueryRegistry::with_timeout(MemoryStore::default(), Duration::from_millis(20));
        let reader = registry.state.read();
        let err = registry.resolve([1]).unwrap_err();
        assert!(matches!(err, RegistryError::Timeout(_)));
        assert_eq!(registry.store().calls(), 0);
        drop(reader);

        assert_eq!(registry.resolve([1]).unwrap(), 1);
    }
}

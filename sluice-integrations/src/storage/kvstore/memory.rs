//! In-memory KVStore implementation.

use async_trait::async_trait;
use serde_json::Value;
use sluice_core::{traits::KVStore, Result};
use std::{collections::HashMap, path::Path};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

type Collections = HashMap<String, HashMap<String, Value>>;

/// In-memory key-value store implementation.
///
/// All collections live in one map behind a `tokio` read-write lock, so the
/// store can be shared across tasks. [`persist`](KVStore::persist) writes
/// the whole map as a single JSON file.
///
/// # Examples
///
/// ```rust
/// use sluice_integrations::storage::kvstore::InMemoryKVStore;
/// use sluice_core::traits::{KVStore, DEFAULT_COLLECTION};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryKVStore::new();
///
/// store.put("key1", json!({"name": "test"}), DEFAULT_COLLECTION).await.unwrap();
///
/// let value = store.get("key1", DEFAULT_COLLECTION).await.unwrap();
/// assert!(value.is_some());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryKVStore {
    collections: RwLock<Collections>,
}

impl InMemoryKVStore {
    /// Create a new in-memory KV store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory KV store with initial data.
    pub fn with_data(initial_data: HashMap<String, HashMap<String, Value>>) -> Self {
        Self {
            collections: RwLock::new(initial_data),
        }
    }

    /// Create a store holding the contents persisted at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_persist_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let data: Collections = serde_json::from_str(&content)?;
        info!("Loaded KV store from: {}", path.as_ref().display());
        Ok(Self::with_data(data))
    }

    /// Get a snapshot of all data in the store.
    pub async fn snapshot(&self) -> HashMap<String, HashMap<String, Value>> {
        self.collections.read().await.clone()
    }

    /// Clear all data from the store.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
        debug!("Cleared all data from in-memory KV store");
    }
}

#[async_trait]
impl KVStore for InMemoryKVStore {
    async fn put(&self, key: &str, value: Value, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);

        debug!("Put key '{}' in collection '{}'", key, collection);
        Ok(())
    }

    async fn get(&self, key: &str, collection: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|coll| coll.get(key))
            .cloned())
    }

    async fn delete(&self, key: &str, collection: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let deleted = collections
            .get_mut(collection)
            .is_some_and(|coll| coll.remove(key).is_some());

        debug!(
            "Delete key '{}' from collection '{}': {}",
            key,
            collection,
            if deleted { "deleted" } else { "not found" }
        );
        Ok(deleted)
    }

    async fn get_all(&self, collection: &str) -> Result<HashMap<String, Value>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn put_all(&self, pairs: Vec<(String, Value)>, collection: &str) -> Result<()> {
        let count = pairs.len();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(pairs);

        debug!("Put {} items in collection '{}'", count, collection);
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, HashMap::len))
    }

    async fn persist(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&*self.collections.read().await)?;
        tokio::fs::write(path, serialized).await?;
        info!("Persisted KV store to: {}", path.display());
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path).await? {
            warn!("KV store file does not exist: {}", path.display());
            return Ok(());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let data: Collections = serde_json::from_str(&content)?;
        *self.collections.write().await = data;
        info!("Loaded KV store from: {}", path.display());
        Ok(())
    }
}

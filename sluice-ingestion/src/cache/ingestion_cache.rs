//! Result cache for transformation stages.
//!
//! Each entry maps a fingerprint of (input nodes, stage identity) to the
//! nodes that stage produced for that input. The cache is advisory: running
//! without it yields the same nodes, only slower.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sluice_core::{traits::TransformIdentity, MetadataMode, Node};
use std::{
    collections::HashMap,
    path::Path,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{fs, sync::RwLock};
use tracing::{debug, info, warn};

use crate::error::Result as IngestionResult;

/// Default cache collection name.
pub const DEFAULT_CACHE_COLLECTION: &str = "sluice_cache";

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Cached output of one stage applied to one input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached nodes.
    pub nodes: Vec<Node>,
    /// Unix timestamp (seconds) when the entry was created.
    pub created_at: u64,
    /// Optional TTL for the entry.
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    /// Create a new cache entry.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            created_at: now_secs(),
            ttl: None,
        }
    }

    /// Create a new cache entry with TTL.
    pub fn with_ttl(nodes: Vec<Node>, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new(nodes)
        }
    }

    /// Check if the entry has expired.
    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => now_secs() > self.created_at.saturating_add(ttl.as_secs()),
            None => false,
        }
    }
}

/// Storage medium behind an [`IngestionCache`].
///
/// Implementations must tolerate concurrent calls; concurrent writes to the
/// same key may resolve in any order.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Put a value into the cache.
    async fn put(&self, key: &str, entry: CacheEntry, collection: &str) -> IngestionResult<()>;

    /// Get a value from the cache.
    async fn get(&self, key: &str, collection: &str) -> IngestionResult<Option<CacheEntry>>;

    /// Delete a value from the cache.
    async fn delete(&self, key: &str, collection: &str) -> IngestionResult<bool>;

    /// Get all keys in a collection.
    async fn get_all_keys(&self, collection: &str) -> IngestionResult<Vec<String>>;

    /// Clear all entries in a collection.
    async fn clear(&self, collection: &str) -> IngestionResult<()>;

    /// Persist the cache to storage (if supported).
    async fn persist(&self, path: &Path) -> IngestionResult<()>;

    /// Load the cache from storage (if supported).
    async fn load(&self, path: &Path) -> IngestionResult<()>;
}

/// Simple in-memory cache backend, persisted as JSON.
#[derive(Debug, Default)]
pub struct SimpleCacheBackend {
    /// Entries organized by collection.
    storage: RwLock<HashMap<String, HashMap<String, CacheEntry>>>,
}

impl SimpleCacheBackend {
    /// Create a new simple cache backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for SimpleCacheBackend {
    async fn put(&self, key: &str, entry: CacheEntry, collection: &str) -> IngestionResult<()> {
        let mut storage = self.storage.write().await;
        storage
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), entry);

        debug!("Cached entry with key: {}", key);
        Ok(())
    }

    async fn get(&self, key: &str, collection: &str) -> IngestionResult<Option<CacheEntry>> {
        let storage = self.storage.read().await;
        let entry = storage
            .get(collection)
            .and_then(|entries| entries.get(key))
            .cloned();

        match &entry {
            Some(_) => debug!("Cache hit for key: {}", key),
            None => debug!("Cache miss for key: {}", key),
        }
        Ok(entry)
    }

    async fn delete(&self, key: &str, collection: &str) -> IngestionResult<bool> {
        let mut storage = self.storage.write().await;
        let removed = storage
            .get_mut(collection)
            .is_some_and(|entries| entries.remove(key).is_some());
        debug!("Deleted cache entry for key: {}, existed: {}", key, removed);
        Ok(removed)
    }

    async fn get_all_keys(&self, collection: &str) -> IngestionResult<Vec<String>> {
        let storage = self.storage.read().await;
        Ok(storage
            .get(collection)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, collection: &str) -> IngestionResult<()> {
        let mut storage = self.storage.write().await;
        if let Some(entries) = storage.get_mut(collection) {
            let count = entries.len();
            entries.clear();
            info!("Cleared {} entries from collection: {}", count, collection);
        }
        Ok(())
    }

    async fn persist(&self, path: &Path) -> IngestionResult<()> {
        let serialized = {
            let storage = self.storage.read().await;
            serde_json::to_string_pretty(&*storage)?
        };
        fs::write(path, serialized).await?;

        info!("Persisted cache to: {}", path.display());
        Ok(())
    }

    async fn load(&self, path: &Path) -> IngestionResult<()> {
        if !fs::try_exists(path).await? {
            warn!("Cache file does not exist: {}", path.display());
            return Ok(());
        }

        let content = fs::read_to_string(path).await?;
        let loaded: HashMap<String, HashMap<String, CacheEntry>> = serde_json::from_str(&content)?;
        *self.storage.write().await = loaded;

        info!("Loaded cache from: {}", path.display());
        Ok(())
    }
}

/// Stage-level result cache.
///
/// Cloning is cheap and clones share the same backend.
///
/// # Examples
///
/// ```rust
/// use sluice_ingestion::cache::IngestionCache;
/// use sluice_core::Node;
///
/// # tokio_test::block_on(async {
/// let cache = IngestionCache::simple();
/// let nodes: Vec<Node> = vec![];
/// cache.put("fingerprint", nodes).await.unwrap();
/// assert!(cache.get("fingerprint").await.unwrap().is_some());
/// assert!(cache.get("unknown").await.unwrap().is_none());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct IngestionCache {
    backend: Arc<dyn CacheBackend>,
    collection: String,
    ttl: Option<Duration>,
}

impl IngestionCache {
    /// Create a new ingestion cache on `backend`.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            collection: DEFAULT_CACHE_COLLECTION.to_string(),
            ttl: None,
        }
    }

    /// Create a simple in-memory cache.
    pub fn simple() -> Self {
        Self::new(Arc::new(SimpleCacheBackend::new()))
    }

    /// Use a different collection on the same backend.
    #[must_use]
    pub fn with_collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.collection = collection.into();
        self
    }

    /// Expire new entries after `ttl`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Create an in-memory cache preloaded from a persisted file.
    pub async fn from_persist_path<P: AsRef<Path>>(path: P) -> IngestionResult<Self> {
        let backend = Arc::new(SimpleCacheBackend::new());
        backend.load(path.as_ref()).await?;
        Ok(Self::new(backend))
    }

    /// The collection this cache reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Store the output nodes of a stage under `key`.
    pub async fn put(&self, key: &str, nodes: Vec<Node>) -> IngestionResult<()> {
        let entry = match self.ttl {
            Some(ttl) => CacheEntry::with_ttl(nodes, ttl),
            None => CacheEntry::new(nodes),
        };
        self.backend.put(key, entry, &self.collection).await
    }

    /// Get the nodes cached under `key`, if present and not expired.
    pub async fn get(&self, key: &str) -> IngestionResult<Option<Vec<Node>>> {
        match self.backend.get(key, &self.collection).await? {
            Some(entry) if entry.is_expired() => {
                self.backend.delete(key, &self.collection).await?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.nodes)),
            None => Ok(None),
        }
    }

    /// Delete an entry from the cache.
    pub async fn delete(&self, key: &str) -> IngestionResult<bool> {
        self.backend.delete(key, &self.collection).await
    }

    /// Clear all entries in this cache's collection.
    pub async fn clear(&self) -> IngestionResult<()> {
        self.backend.clear(&self.collection).await
    }

    /// Get all keys in this cache's collection.
    pub async fn get_all_keys(&self) -> IngestionResult<Vec<String>> {
        self.backend.get_all_keys(&self.collection).await
    }

    /// Persist the cache to a file.
    pub async fn persist<P: AsRef<Path>>(&self, path: P) -> IngestionResult<()> {
        self.backend.persist(path.as_ref()).await
    }

    /// Load the cache from a file.
    pub async fn load<P: AsRef<Path>>(&self, path: P) -> IngestionResult<()> {
        self.backend.load(path.as_ref()).await
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> IngestionResult<CacheStats> {
        let keys = self.get_all_keys().await?;
        let total_entries = keys.len();

        let mut expired_entries = 0;
        for key in &keys {
            if let Some(entry) = self.backend.get(key, &self.collection).await? {
                if entry.is_expired() {
                    expired_entries += 1;
                }
            }
        }

        Ok(CacheStats {
            total_entries,
            expired_entries,
            active_entries: total_entries - expired_entries,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total number of entries.
    pub total_entries: usize,
    /// Number of expired entries.
    pub expired_entries: usize,
    /// Number of active (non-expired) entries.
    pub active_entries: usize,
}

/// Fingerprint of a stage applied to a node sequence.
pub struct TransformationHasher;

impl TransformationHasher {
    /// SHA-256 over each node's identity, modality and rendered content,
    /// followed by the stage identity.
    ///
    /// A cache hit replays the stored nodes verbatim, so everything a stage
    /// passes through unchanged has to be part of the key. Variable-length
    /// fields are length-prefixed, so moving text across a node boundary
    /// changes the key.
    pub fn hash(nodes: &[Node], identity: &TransformIdentity) -> String {
        let mut hasher = Sha256::new();

        hasher.update((nodes.len() as u64).to_le_bytes());
        for node in nodes {
            hasher.update(node.id.as_bytes());
            hasher.update(node.source_document_id.as_bytes());

            let modality = node.modality.to_string();
            hasher.update((modality.len() as u64).to_le_bytes());
            hasher.update(modality.as_bytes());

            let content = node.get_content(MetadataMode::All);
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(content.as_bytes());
        }

        let config = identity.config.to_string();
        hasher.update((identity.kind.len() as u64).to_le_bytes());
        hasher.update(identity.kind.as_bytes());
        hasher.update((config.len() as u64).to_le_bytes());
        hasher.update(config.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

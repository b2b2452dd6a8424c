//! Key-value store trait backing the tracking store.
//!
//! Each collection acts as a namespace for keys.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::Result;

/// Default collection name for KV operations.
pub const DEFAULT_COLLECTION: &str = "data";

/// Key-value store with collection namespaces.
#[async_trait]
pub trait KVStore: Send + Sync + std::fmt::Debug {
    /// Put a key-value pair in the specified collection, overwriting any
    /// previous value.
    async fn put(&self, key: &str, value: Value, collection: &str) -> Result<()>;

    /// Get a value by key from the specified collection.
    async fn get(&self, key: &str, collection: &str) -> Result<Option<Value>>;

    /// Delete a key from the specified collection.
    ///
    /// # Returns
    ///
    /// `true` if the key was deleted, `false` if it didn't exist.
    async fn delete(&self, key: &str, collection: &str) -> Result<bool>;

    /// Get all key-value pairs from a collection.
    async fn get_all(&self, collection: &str) -> Result<HashMap<String, Value>>;

    /// Put multiple key-value pairs in a collection.
    ///
    /// The default implementation calls [`put`](KVStore::put) for each pair.
    async fn put_all(&self, pairs: Vec<(String, Value)>, collection: &str) -> Result<()> {
        for (key, value) in pairs {
            self.put(&key, value, collection).await?;
        }
        Ok(())
    }

    /// Count the keys in a collection.
    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.get_all(collection).await?.len())
    }

    /// Write the store contents to `path`, if the backend supports it.
    async fn persist(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Replace the store contents with those persisted at `path`, if the
    /// backend supports it.
    async fn load(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

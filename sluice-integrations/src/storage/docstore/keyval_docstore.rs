//! Key-value based tracking store.

use async_trait::async_trait;
use serde_json::{json, Value};
use sluice_core::{
    traits::{DocumentStore, KVStore, RefDocInfo},
    Node, Result, SluiceError,
};
use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::{debug, info};

use crate::storage::kvstore::InMemoryKVStore;

/// Default namespace for the store's collections.
pub const DEFAULT_NAMESPACE: &str = "docstore";

/// Tracking store on top of a [`KVStore`].
///
/// Three collections are kept under the namespace:
///
/// - `{namespace}/data`: node id to serialized node
/// - `{namespace}/metadata`: node or reference document id to
///   `{ "doc_hash", "ref_doc_id" }`
/// - `{namespace}/ref_doc_info`: reference document id to the ids of its
///   nodes
///
/// # Examples
///
/// ```rust
/// use sluice_integrations::storage::{docstore::KVDocumentStore, kvstore::InMemoryKVStore};
/// use sluice_core::{traits::DocumentStore, Document, Node};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let store = KVDocumentStore::new(Arc::new(InMemoryKVStore::new()), None);
/// let node = Node::from(Document::new("test content"));
/// let id = node.id.to_string();
///
/// store.add_documents(vec![node.clone()], false).await.unwrap();
/// assert!(store.document_exists(&id).await.unwrap());
/// assert_eq!(store.get_document_hash(&id).await.unwrap(), Some(node.hash()));
/// # });
/// ```
#[derive(Debug)]
pub struct KVDocumentStore {
    kv_store: Arc<dyn KVStore>,
    namespace: String,
    data_collection: String,
    metadata_collection: String,
    ref_doc_collection: String,
}

impl KVDocumentStore {
    /// Create a tracking store over `kv_store`.
    ///
    /// `namespace` defaults to [`DEFAULT_NAMESPACE`].
    pub fn new(kv_store: Arc<dyn KVStore>, namespace: Option<String>) -> Self {
        let namespace = namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        info!("Created KV document store with namespace '{}'", namespace);

        Self {
            kv_store,
            data_collection: format!("{namespace}/data"),
            metadata_collection: format!("{namespace}/metadata"),
            ref_doc_collection: format!("{namespace}/ref_doc_info"),
            namespace,
        }
    }

    /// Create an in-memory tracking store from a file written by
    /// [`persist`](DocumentStore::persist).
    pub async fn from_persist_path<P: AsRef<Path>>(
        path: P,
        namespace: Option<String>,
    ) -> Result<Self> {
        let kv_store = InMemoryKVStore::from_persist_path(path).await?;
        Ok(Self::new(Arc::new(kv_store), namespace))
    }

    /// Get the namespace used by this store.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get a tracked node.
    pub async fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        match self.kv_store.get(node_id, &self.data_collection).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Number of tracked nodes.
    pub async fn count_documents(&self) -> Result<usize> {
        self.kv_store.count(&self.data_collection).await
    }

    async fn get_ref_doc_info(&self, ref_doc_id: &str) -> Result<Option<RefDocInfo>> {
        match self.kv_store.get(ref_doc_id, &self.ref_doc_collection).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for KVDocumentStore {
    async fn add_documents(&self, nodes: Vec<Node>, allow_update: bool) -> Result<()> {
        for node in nodes {
            let node_id = node.id.to_string();
            if !allow_update && self.document_exists(&node_id).await? {
                return Err(SluiceError::validation(format!(
                    "Node {node_id} already exists; set allow_update to overwrite it"
                )));
            }

            let ref_doc_id = node.ref_doc_id();
            let metadata = json!({ "doc_hash": node.hash(), "ref_doc_id": ref_doc_id });

            self.kv_store
                .put(&node_id, serde_json::to_value(&node)?, &self.data_collection)
                .await?;
            self.kv_store
                .put(&node_id, metadata, &self.metadata_collection)
                .await?;

            let mut info = self.get_ref_doc_info(&ref_doc_id).await?.unwrap_or_default();
            if !info.node_ids.contains(&node_id) {
                info.node_ids.push(node_id);
                self.kv_store
                    .put(&ref_doc_id, serde_json::to_value(&info)?, &self.ref_doc_collection)
                    .await?;
            }
        }
        Ok(())
    }

    async fn document_exists(&self, doc_id: &str) -> Result<bool> {
        Ok(self.kv_store.get(doc_id, &self.data_collection).await?.is_some())
    }

    async fn get_document_hash(&self, doc_id: &str) -> Result<Option<String>> {
        let metadata = self.kv_store.get(doc_id, &self.metadata_collection).await?;
        Ok(metadata
            .as_ref()
            .and_then(|m| m.get("doc_hash"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn set_document_hash(&self, doc_id: &str, hash: &str) -> Result<()> {
        let mut metadata = self
            .kv_store
            .get(doc_id, &self.metadata_collection)
            .await?
            .filter(Value::is_object)
            .unwrap_or_else(|| json!({}));
        metadata["doc_hash"] = Value::String(hash.to_string());
        self.kv_store
            .put(doc_id, metadata, &self.metadata_collection)
            .await
    }

    async fn get_all_document_hashes(&self) -> Result<HashMap<String, String>> {
        let all = self.kv_store.get_all(&self.metadata_collection).await?;
        Ok(all
            .into_iter()
            .filter_map(|(id, metadata)| {
                metadata
                    .get("doc_hash")
                    .and_then(Value::as_str)
                    .map(|hash| (hash.to_string(), id))
            })
            .collect())
    }

    async fn get_all_ref_doc_info(&self) -> Result<HashMap<String, RefDocInfo>> {
        let all = self.kv_store.get_all(&self.ref_doc_collection).await?;
        let mut infos = HashMap::with_capacity(all.len());
        for (ref_doc_id, value) in all {
            infos.insert(ref_doc_id, serde_json::from_value(value)?);
        }
        Ok(infos)
    }

    async fn delete_ref_doc(&self, ref_doc_id: &str) -> Result<()> {
        let Some(info) = self.get_ref_doc_info(ref_doc_id).await? else {
            debug!("Reference document '{}' is not tracked", ref_doc_id);
            return Ok(());
        };

        for node_id in &info.node_ids {
            self.kv_store.delete(node_id, &self.data_collection).await?;
            self.kv_store.delete(node_id, &self.metadata_collection).await?;
        }
        self.kv_store.delete(ref_doc_id, &self.ref_doc_collection).await?;
        self.kv_store.delete(ref_doc_id, &self.metadata_collection).await?;

        debug!(
            "Deleted reference document '{}' and {} nodes",
            ref_doc_id,
            info.node_ids.len()
        );
        Ok(())
    }

    async fn persist(&self, path: &Path) -> Result<()> {
        self.kv_store.persist(path).await
    }

    async fn load(&self, path: &Path) -> Result<()> {
        self.kv_store.load(path).await
    }
}

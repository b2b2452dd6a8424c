//! In-memory vector store implementation.
//!
//! Keeps every inserted node in memory. Useful for development and tests:
//! besides the stored nodes it remembers the size of each `add` call.

use async_trait::async_trait;
use sluice_core::{traits::VectorStore, Node, Result, SluiceError};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-memory vector store implementation.
///
/// # Examples
///
/// ```rust
/// use sluice_integrations::InMemoryVectorStore;
/// use sluice_core::{traits::VectorStore, ChunkInfo, Node};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryVectorStore::new(3);
/// let node = Node::new("hello", uuid::Uuid::new_v4(), ChunkInfo::default())
///     .with_embedding(vec![0.1, 0.2, 0.3]);
///
/// let ids = store.add(vec![node]).await.unwrap();
/// assert_eq!(ids.len(), 1);
/// assert_eq!(store.count().await.unwrap(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    dimension: Option<usize>,
    nodes: RwLock<HashMap<Uuid, Node>>,
    add_batches: RwLock<Vec<usize>>,
}

impl InMemoryVectorStore {
    /// Create a store accepting embeddings of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    /// Create a store accepting embeddings of any dimension.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Get the vector dimension, if fixed.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Get a stored node by id.
    pub async fn get(&self, id: &Uuid) -> Option<Node> {
        self.nodes.read().await.get(id).cloned()
    }

    /// All stored nodes, in no particular order.
    pub async fn nodes(&self) -> Vec<Node> {
        self.nodes.read().await.values().cloned().collect()
    }

    /// Number of nodes passed to each `add` call so far.
    pub async fn add_batches(&self) -> Vec<usize> {
        self.add_batches.read().await.clone()
    }

    fn validate(&self, node: &Node) -> Result<()> {
        let Some(embedding) = &node.embedding else {
            return Err(SluiceError::validation(format!(
                "Node {} has no embedding",
                node.id
            )));
        };
        match self.dimension {
            Some(dimension) if embedding.len() != dimension => {
                Err(SluiceError::validation(format!(
                    "Vector dimension {} does not match store dimension {}",
                    embedding.len(),
                    dimension
                )))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, nodes: Vec<Node>) -> Result<Vec<Uuid>> {
        for node in &nodes {
            self.validate(node)?;
        }

        let ids: Vec<Uuid> = nodes.iter().map(|n| n.id).collect();
        self.add_batches.write().await.push(nodes.len());

        let mut storage = self.nodes.write().await;
        for node in nodes {
            storage.insert(node.id, node);
        }

        debug!("Added {} nodes to InMemoryVectorStore", ids.len());
        Ok(ids)
    }

    async fn delete_ref_doc(&self, ref_doc_id: &str) -> Result<()> {
        let mut storage = self.nodes.write().await;
        let before = storage.len();
        storage.retain(|_, node| node.ref_doc_id() != ref_doc_id);

        debug!(
            "Deleted {} nodes of reference document '{}'",
            before - storage.len(),
            ref_doc_id
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "InMemoryVectorStore"
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.nodes.read().await.len())
    }
}

//! Destination store traits.
//!
//! Destination stores receive the embedding-bearing nodes at the end of a
//! pipeline run. Each store serves one or more modalities; the
//! [`VectorStoreMap`] routes each modality to its store.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ModalityType, Node, Result};

/// Stores embedding-bearing nodes.
///
/// # Examples
///
/// ```rust
/// use sluice_core::traits::VectorStore;
/// use sluice_core::{Node, Result};
/// use async_trait::async_trait;
/// use uuid::Uuid;
///
/// #[derive(Debug)]
/// struct NullStore;
///
/// #[async_trait]
/// impl VectorStore for NullStore {
///     async fn add(&self, nodes: Vec<Node>) -> Result<Vec<Uuid>> {
///         Ok(nodes.iter().map(|n| n.id).collect())
///     }
///
///     async fn delete_ref_doc(&self, _ref_doc_id: &str) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Add nodes to the store.
    ///
    /// # Returns
    ///
    /// The identifiers assigned to the stored nodes, in input order.
    async fn add(&self, nodes: Vec<Node>) -> Result<Vec<Uuid>>;

    /// Delete every node derived from the given reference document.
    async fn delete_ref_doc(&self, ref_doc_id: &str) -> Result<()>;

    /// Get a human-readable name for this store.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Get the total number of nodes in the store.
    async fn count(&self) -> Result<usize> {
        Ok(0)
    }
}

/// Destination stores keyed by modality.
#[derive(Debug, Clone, Default)]
pub struct VectorStoreMap {
    text: Option<Arc<dyn VectorStore>>,
    image: Option<Arc<dyn VectorStore>>,
    audio: Option<Arc<dyn VectorStore>>,
    video: Option<Arc<dyn VectorStore>>,
}

impl VectorStoreMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map that routes text nodes to `store` and nothing else.
    pub fn text_only(store: Arc<dyn VectorStore>) -> Self {
        Self::new().with_store(ModalityType::Text, store)
    }

    /// Register `store` for `modality`, replacing any previous entry.
    #[must_use]
    pub fn with_store(mut self, modality: ModalityType, store: Arc<dyn VectorStore>) -> Self {
        self.insert(modality, store);
        self
    }

    /// Register `store` for `modality`, returning the previous entry.
    pub fn insert(
        &mut self,
        modality: ModalityType,
        store: Arc<dyn VectorStore>,
    ) -> Option<Arc<dyn VectorStore>> {
        self.slot_mut(modality).replace(store)
    }

    /// Look up the store for `modality`.
    pub fn get(&self, modality: ModalityType) -> Option<&Arc<dyn VectorStore>> {
        match modality {
            ModalityType::Text => self.text.as_ref(),
            ModalityType::Image => self.image.as_ref(),
            ModalityType::Audio => self.audio.as_ref(),
            ModalityType::Video => self.video.as_ref(),
        }
    }

    fn slot_mut(&mut self, modality: ModalityType) -> &mut Option<Arc<dyn VectorStore>> {
        match modality {
            ModalityType::Text => &mut self.text,
            ModalityType::Image => &mut self.image,
            ModalityType::Audio => &mut self.audio,
            ModalityType::Video => &mut self.video,
        }
    }

    /// Registered modalities, in fan-out order.
    pub fn modalities(&self) -> Vec<ModalityType> {
        ModalityType::all()
            .into_iter()
            .filter(|modality| self.get(*modality).is_some())
            .collect()
    }

    /// Distinct registered stores. A store serving several modalities is
    /// listed once.
    pub fn stores(&self) -> Vec<Arc<dyn VectorStore>> {
        let mut stores: Vec<Arc<dyn VectorStore>> = Vec::new();
        for modality in ModalityType::all() {
            if let Some(store) = self.get(modality) {
                if !stores.iter().any(|seen| Arc::ptr_eq(seen, store)) {
                    stores.push(Arc::clone(store));
                }
            }
        }
        stores
    }

    /// Check if no store is registered.
    pub fn is_empty(&self) -> bool {
        self.modalities().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NullStore;

    #[async_trait]
    impl VectorStore for NullStore {
        async fn add(&self, nodes: Vec<Node>) -> Result<Vec<Uuid>> {
            Ok(nodes.iter().map(|n| n.id).collect())
        }

        async fn delete_ref_doc(&self, _ref_doc_id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_text_only_map() {
        let map = VectorStoreMap::text_only(Arc::new(NullStore));
        assert!(map.get(ModalityType::Text).is_some());
        assert!(map.get(ModalityType::Image).is_none());
        assert_eq!(map.modalities(), vec![ModalityType::Text]);
    }

    #[test]
    fn test_shared_store_listed_once() {
        let shared: Arc<dyn VectorStore> = Arc::new(NullStore);
        let map = VectorStoreMap::new()
            .with_store(ModalityType::Image, Arc::clone(&shared))
            .with_store(ModalityType::Text, shared)
            .with_store(ModalityType::Audio, Arc::new(NullStore));

        assert_eq!(map.stores().len(), 2);
        assert_eq!(
            map.modalities(),
            vec![ModalityType::Text, ModalityType::Image, ModalityType::Audio]
        );
        assert!(!map.is_empty());
        assert!(VectorStoreMap::new().is_empty());
    }
}

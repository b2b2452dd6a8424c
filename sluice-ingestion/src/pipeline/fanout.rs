//! Routes finished nodes to destination stores by modality.

use futures::future::BoxFuture;
use sluice_core::{
    traits::{VectorStore, VectorStoreMap},
    ModalityType, Node, Result, SluiceError,
};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;
use uuid::Uuid;

/// Observer awaited after each destination store insert, with the ids the
/// store returned, the nodes inserted and the store itself.
pub type NodesAddedCallback = Arc<
    dyn Fn(Vec<Uuid>, Vec<Node>, Arc<dyn VectorStore>) -> BoxFuture<'static, Result<()>>
        + Send
        + Sync,
>;

/// Insert `nodes` into the store registered for their modality.
///
/// Stores are resolved for every modality present before anything is
/// inserted, so a missing store leaves all stores untouched. Partitions are
/// then inserted one at a time in [`ModalityType::all`] order.
///
/// # Errors
///
/// [`SluiceError::MissingVectorStore`] if a modality has no store; store
/// and callback errors are returned unchanged.
pub async fn add_nodes_to_vector_stores(
    nodes: Vec<Node>,
    stores: &VectorStoreMap,
    on_added: Option<&NodesAddedCallback>,
) -> Result<()> {
    let mut partitions: HashMap<ModalityType, Vec<Node>> = HashMap::new();
    for node in nodes {
        partitions.entry(node.modality).or_default().push(node);
    }

    let mut batches = Vec::with_capacity(partitions.len());
    for modality in ModalityType::all() {
        let Some(partition) = partitions.remove(&modality) else {
            continue;
        };
        let store = stores
            .get(modality)
            .ok_or(SluiceError::MissingVectorStore { modality })?;
        batches.push((modality, Arc::clone(store), partition));
    }

    for (modality, store, partition) in batches {
        debug!(
            "Adding {} {} nodes to {}",
            partition.len(),
            modality,
            store.name()
        );
        match on_added {
            Some(callback) => {
                let ids = store.add(partition.clone()).await?;
                callback(ids, partition, store).await?;
            }
            None => {
                store.add(partition).await?;
            }
        }
    }

    Ok(())
}

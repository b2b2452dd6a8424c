use sluice_core::{
    traits::{DocumentStore, TransformOptions},
    Node, Result,
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info};

/// Drops nodes whose content hash is already tracked or repeats within the
/// batch.
///
/// Kept nodes are recorded in the tracking store under their current hash,
/// overwriting whatever was tracked for the same node id. Nothing is
/// deleted.
#[derive(Debug, Clone)]
pub struct DuplicatesOnlyStrategy {
    docstore: Arc<dyn DocumentStore>,
}

impl DuplicatesOnlyStrategy {
    /// Create the strategy over `docstore`.
    pub fn new(docstore: Arc<dyn DocumentStore>) -> Self {
        Self { docstore }
    }

    pub(crate) async fn apply(
        &self,
        nodes: Vec<Node>,
        options: &TransformOptions,
    ) -> Result<Vec<Node>> {
        let existing = self.docstore.get_all_document_hashes().await?;
        let total = nodes.len();

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(total);
        for node in nodes {
            let hash = node.hash();
            if existing.contains_key(&hash) || !seen.insert(hash) {
                debug!("Skipping duplicate node {}", node.id);
                continue;
            }
            unique.push(node);
        }

        if !unique.is_empty() {
            self.docstore.add_documents(unique.clone(), true).await?;
        }

        if options.show_progress {
            info!(
                "Deduplication kept {}/{} nodes (duplicates only)",
                unique.len(),
                total
            );
        }
        Ok(unique)
    }
}

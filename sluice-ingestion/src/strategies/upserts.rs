use sha2::{Digest, Sha256};
use sluice_core::{
    traits::{DocumentStore, TransformOptions, VectorStore},
    Node, Result,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, info};

/// Upserts nodes per reference document.
///
/// All nodes sharing a reference document are judged together: the group is
/// dropped when its hash matches the tracked one, and otherwise kept, with
/// any stale version removed from the tracking store and the destination
/// stores first.
#[derive(Debug, Clone)]
pub struct UpsertsStrategy {
    docstore: Arc<dyn DocumentStore>,
    vector_stores: Vec<Arc<dyn VectorStore>>,
    delete_missing: bool,
}

impl UpsertsStrategy {
    /// Create the strategy over `docstore`, cleaning up `vector_stores` on
    /// change.
    pub fn new(docstore: Arc<dyn DocumentStore>, vector_stores: Vec<Arc<dyn VectorStore>>) -> Self {
        Self {
            docstore,
            vector_stores,
            delete_missing: false,
        }
    }

    /// Also delete tracked reference documents absent from the input.
    #[must_use]
    pub fn with_delete_missing(mut self, delete_missing: bool) -> Self {
        self.delete_missing = delete_missing;
        self
    }

    /// Whether reference documents missing from the input are deleted.
    pub fn deletes_missing(&self) -> bool {
        self.delete_missing
    }

    async fn delete_ref_doc(&self, ref_doc_id: &str) -> Result<()> {
        self.docstore.delete_ref_doc(ref_doc_id).await?;
        for store in &self.vector_stores {
            store.delete_ref_doc(ref_doc_id).await?;
        }
        Ok(())
    }

    pub(crate) async fn apply(
        &self,
        nodes: Vec<Node>,
        options: &TransformOptions,
    ) -> Result<Vec<Node>> {
        let total = nodes.len();
        let groups = group_by_ref_doc(nodes);
        let seen_refs: HashSet<String> = groups.iter().map(|(ref_id, _)| ref_id.clone()).collect();

        let mut kept = Vec::with_capacity(total);
        for (ref_doc_id, group) in groups {
            let hash = group_hash(&group);

            match self.docstore.get_document_hash(&ref_doc_id).await? {
                Some(existing) if existing == hash => {
                    debug!("Skipping unchanged document {}", ref_doc_id);
                    continue;
                }
                Some(_) => {
                    debug!("Document {} changed, replacing it", ref_doc_id);
                    self.delete_ref_doc(&ref_doc_id).await?;
                }
                None => debug!("New document {}", ref_doc_id),
            }

            self.docstore.add_documents(group.clone(), true).await?;
            self.docstore.set_document_hash(&ref_doc_id, &hash).await?;
            kept.extend(group);
        }

        if self.delete_missing {
            let tracked = self.docstore.get_all_ref_doc_info().await?;
            for ref_doc_id in tracked.keys().filter(|id| !seen_refs.contains(*id)) {
                debug!("Document {} no longer present, deleting it", ref_doc_id);
                self.delete_ref_doc(ref_doc_id).await?;
            }
        }

        if options.show_progress {
            info!("Deduplication kept {}/{} nodes (upserts)", kept.len(), total);
        }
        Ok(kept)
    }
}

/// Group nodes by reference document, keeping first-appearance order both
/// across groups and within each group.
fn group_by_ref_doc(nodes: Vec<Node>) -> Vec<(String, Vec<Node>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Node>)> = Vec::new();
    for node in nodes {
        let ref_doc_id = node.ref_doc_id();
        match index.get(&ref_doc_id) {
            Some(&i) => groups[i].1.push(node),
            None => {
                index.insert(ref_doc_id.clone(), groups.len());
                groups.push((ref_doc_id, vec![node]));
            }
        }
    }
    groups
}

/// A single node keeps its own hash; several are folded in order.
fn group_hash(nodes: &[Node]) -> String {
    if let [node] = nodes {
        return node.hash();
    }
    let mut hasher = Sha256::new();
    for node in nodes {
        hasher.update(node.hash().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

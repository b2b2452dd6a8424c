//! Tracking store interface consumed by the deduplication strategies.
//!
//! A tracking store remembers, per reference document, which nodes were
//! ingested and the content hash they were ingested with.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{Node, Result};

/// Bookkeeping kept for each reference document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefDocInfo {
    /// Ids of the nodes ingested from this document.
    pub node_ids: Vec<String>,
}

/// Tracking store of previously ingested nodes and their hashes.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Record `nodes`, their hashes, and their reference documents.
    ///
    /// With `allow_update == false`, adding a node whose id is already
    /// tracked is an error.
    async fn add_documents(&self, nodes: Vec<Node>, allow_update: bool) -> Result<()>;

    /// Check whether a node or document id is tracked.
    async fn document_exists(&self, doc_id: &str) -> Result<bool>;

    /// Get the hash recorded for a node or reference document id.
    async fn get_document_hash(&self, doc_id: &str) -> Result<Option<String>>;

    /// Record `hash` for a node or reference document id.
    async fn set_document_hash(&self, doc_id: &str, hash: &str) -> Result<()>;

    /// All recorded hashes, as `hash -> id`.
    async fn get_all_document_hashes(&self) -> Result<HashMap<String, String>>;

    /// All tracked reference documents.
    async fn get_all_ref_doc_info(&self) -> Result<HashMap<String, RefDocInfo>>;

    /// Forget a reference document together with all of its nodes and hashes.
    async fn delete_ref_doc(&self, ref_doc_id: &str) -> Result<()>;

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

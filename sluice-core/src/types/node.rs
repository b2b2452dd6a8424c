//! Node structure: the unit of content flowing through the pipeline.
//!
//! Metadata is kept in a `BTreeMap` so that its serialized form, and with it
//! [`Node::hash`] and every cache fingerprint derived from
//! [`Node::get_content`], is independent of insertion order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Document, ModalityType};
use crate::{Result, SluiceError};

/// Metadata mode for controlling which metadata is rendered into content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataMode {
    /// Include all metadata.
    All,
    /// Include no metadata.
    None,
}

/// A content unit flowing through the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Unique identifier for the node.
    pub id: Uuid,

    /// Raw or derived content of the node.
    pub content: String,

    /// Node metadata.
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Dense vector embedding, set by an embedding stage.
    pub embedding: Option<Vec<f32>>,

    /// Modality tag used by destination fan-out.
    pub modality: ModalityType,

    /// Identifier of the document this node was derived from.
    ///
    /// Deduplication tracks nodes by this id.
    pub source_document_id: Uuid,

    /// Information about the chunk's position in the original document.
    pub chunk_info: ChunkInfo,

    /// MIME type of the node content.
    pub mimetype: String,
}

/// Information about a chunk's position in the original document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkInfo {
    /// Start position in original document (character offset).
    pub start_char_idx: Option<usize>,

    /// End position in original document (character offset).
    pub end_char_idx: Option<usize>,

    /// Chunk index in the document (0-based).
    pub chunk_index: usize,
}

impl Node {
    /// Create a new text node with the given content and source document.
    pub fn new<S: Into<String>>(
        content: S,
        source_document_id: Uuid,
        chunk_info: ChunkInfo,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            metadata: BTreeMap::new(),
            embedding: None,
            modality: ModalityType::Text,
            source_document_id,
            chunk_info,
            mimetype: "text/plain".to_string(),
        }
    }

    /// Create a builder for constructing nodes with fluent API.
    #[must_use]
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    /// Identifier of the document this node is tracked under.
    pub fn ref_doc_id(&self) -> String {
        self.source_document_id.to_string()
    }

    /// Content hash over content and metadata.
    pub fn hash(&self) -> String {
        Self::calculate_hash(&self.content, &self.metadata)
    }

    /// Calculate hash from content and metadata.
    pub fn calculate_hash(content: &str, metadata: &BTreeMap<String, serde_json::Value>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hasher.update(
            serde_json::to_string(metadata)
                .unwrap_or_default()
                .as_bytes(),
        );
        format!("{:x}", hasher.finalize())
    }

    /// Get content, optionally followed by rendered metadata.
    pub fn get_content(&self, metadata_mode: MetadataMode) -> String {
        let metadata_str = self.get_metadata_str(metadata_mode);
        if metadata_str.is_empty() {
            return self.content.clone();
        }
        format!("{}\n\n{}", self.content, metadata_str)
    }

    /// Render metadata as `key: value` lines in key order.
    pub fn get_metadata_str(&self, mode: MetadataMode) -> String {
        if mode == MetadataMode::None {
            return String::new();
        }

        self.metadata
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the content of the node.
    pub fn set_content<S: Into<String>>(&mut self, content: S) {
        self.content = content.into();
    }

    /// Add or update metadata for this node.
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the dense embedding for this node.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Set the modality tag for this node.
    pub fn with_modality(mut self, modality: ModalityType) -> Self {
        self.modality = modality;
        self
    }

    /// Get metadata value by key.
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Check if the node has a dense embedding.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    /// Check if the node content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl From<Document> for Node {
    fn from(doc: Document) -> Self {
        let chunk_info = ChunkInfo::with_char_indices(0, doc.content.len(), 0);
        Self {
            id: doc.id,
            content: doc.content,
            metadata: doc.metadata,
            embedding: doc.embedding,
            modality: doc.modality,
            source_document_id: doc.id,
            chunk_info,
            mimetype: doc.mimetype,
        }
    }
}

impl ChunkInfo {
    /// Create new chunk information.
    pub fn new(
        start_char_idx: Option<usize>,
        end_char_idx: Option<usize>,
        chunk_index: usize,
    ) -> Self {
        Self {
            start_char_idx,
            end_char_idx,
            chunk_index,
        }
    }

    /// Create chunk info with character indices.
    pub fn with_char_indices(start: usize, end: usize, chunk_index: usize) -> Self {
        Self {
            start_char_idx: Some(start),
            end_char_idx: Some(end),
            chunk_index,
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let content_preview: String = if self.content.chars().count() > 100 {
            format!("{}...", self.content.chars().take(97).collect::<String>())
        } else {
            self.content.clone()
        };

        write!(f, "Node ID: {}\nText: {}\n", self.id, content_preview)
    }
}

/// Builder for creating nodes with a fluent API.
#[derive(Debug, Default)]
pub struct NodeBuilder {
    id: Option<Uuid>,
    content: Option<String>,
    metadata: BTreeMap<String, serde_json::Value>,
    embedding: Option<Vec<f32>>,
    modality: Option<ModalityType>,
    source_document_id: Option<Uuid>,
    chunk_info: Option<ChunkInfo>,
    mimetype: Option<String>,
}

impl NodeBuilder {
    /// Create a new node builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node ID.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the node content.
    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Add metadata.
    pub fn metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set embedding.
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Set modality.
    pub fn modality(mut self, modality: ModalityType) -> Self {
        self.modality = Some(modality);
        self
    }

    /// Set source document ID.
    pub fn source_document_id(mut self, source_document_id: Uuid) -> Self {
        self.source_document_id = Some(source_document_id);
        self
    }

    /// Set chunk info.
    pub fn chunk_info(mut self, chunk_info: ChunkInfo) -> Self {
        self.chunk_info = Some(chunk_info);
        self
    }

    /// Set MIME type. The modality follows it unless set explicitly.
    pub fn mimetype<S: Into<String>>(mut self, mimetype: S) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Build the node.
    ///
    /// A node without an explicit source document is its own source.
    pub fn build(self) -> Result<Node> {
        let content = self
            .content
            .ok_or_else(|| SluiceError::validation("Node content is required"))?;
        let id = self.id.unwrap_or_else(Uuid::new_v4);
        let mimetype = self.mimetype.unwrap_or_else(|| "text/plain".to_string());
        let modality = self
            .modality
            .unwrap_or_else(|| ModalityType::from_mimetype(&mimetype));

        Ok(Node {
            id,
            content,
            metadata: self.metadata,
            embedding: self.embedding,
            modality,
            source_document_id: self.source_document_id.unwrap_or(id),
            chunk_info: self.chunk_info.unwrap_or_default(),
            mimetype,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_ignores_metadata_insertion_order() {
        let doc_id = Uuid::new_v4();
        let a = Node::new("same", doc_id, ChunkInfo::default())
            .with_metadata("b", 2)
            .with_metadata("a", 1);
        let b = Node::new("same", doc_id, ChunkInfo::default())
            .with_metadata("a", 1)
            .with_metadata("b", 2);

        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.get_content(MetadataMode::All), b.get_content(MetadataMode::All));
    }

    #[test]
    fn test_hash_tracks_content_changes() {
        let mut node = Node::new("before", Uuid::new_v4(), ChunkInfo::default());
        let before = node.hash();
        node.set_content("after");
        assert_ne!(before, node.hash());
    }

    #[test]
    fn test_get_content_modes() {
        let node = Node::new("body", Uuid::new_v4(), ChunkInfo::default())
            .with_metadata("source", "a.txt");
        assert_eq!(node.get_content(MetadataMode::None), "body");
        assert_eq!(
            node.get_content(MetadataMode::All),
            "body\n\nsource: \"a.txt\""
        );
    }

    #[test]
    fn test_builder_defaults_to_self_sourced_node() {
        let node = Node::builder()
            .content("pixels")
            .mimetype("image/png")
            .build()
            .unwrap();

        assert_eq!(node.modality, ModalityType::Image);
        assert_eq!(node.source_document_id, node.id);
        assert!(Node::builder().build().is_err());
    }

    #[test]
    fn test_from_document_keeps_identity() {
        let doc = Document::new("hello").with_metadata("k", "v");
        let doc_id = doc.id;
        let node = Node::from(doc);

        assert_eq!(node.id, doc_id);
        assert_eq!(node.ref_doc_id(), doc_id.to_string());
        assert_eq!(node.chunk_info.end_char_idx, Some(5));
    }
}

//! Document type and related structures.
//!
//! Documents represent raw content from readers or callers before it enters
//! the pipeline as nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::ModalityType;

/// Represents a raw document from a data source.
///
/// # Examples
///
/// ```rust
/// use sluice_core::types::Document;
///
/// let doc = Document::new("This is the document content.")
///     .with_metadata("source", "example.txt");
/// assert_eq!(doc.get_metadata_string("source"), Some("example.txt".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: Uuid,

    /// Raw content of the document.
    pub content: String,

    /// Document metadata (source, author, etc.).
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Optional pre-computed embedding for the entire document.
    pub embedding: Option<Vec<f32>>,

    /// Modality of the document content.
    pub modality: ModalityType,

    /// MIME type of the document content.
    pub mimetype: String,
}

impl Document {
    /// Create a new text document with the given content.
    ///
    /// ```rust
    /// use sluice_core::types::Document;
    ///
    /// let doc = Document::new("Hello, world!");
    /// assert_eq!(doc.content, "Hello, world!");
    /// assert!(doc.metadata.is_empty());
    /// assert!(doc.embedding.is_none());
    /// ```
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self::with_id(Uuid::new_v4(), content)
    }

    /// Create a new document with a specific ID.
    ///
    /// Re-submitting a document under the same ID is what lets the upsert
    /// deduplication strategies detect changed content.
    pub fn with_id<S: Into<String>>(id: Uuid, content: S) -> Self {
        Self {
            id,
            content: content.into(),
            metadata: BTreeMap::new(),
            embedding: None,
            modality: ModalityType::Text,
            mimetype: "text/plain".to_string(),
        }
    }

    /// Create a builder for constructing documents with fluent API.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Add or update metadata for this document.
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the embedding for this document.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Set the modality of this document.
    pub fn with_modality(mut self, modality: ModalityType) -> Self {
        self.modality = modality;
        self
    }

    /// Get metadata value by key.
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Get metadata value as a string.
    pub fn get_metadata_string(&self, key: &str) -> Option<String> {
        self.metadata.get(key)?.as_str().map(String::from)
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Builder for creating documents with a fluent API.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    id: Option<Uuid>,
    content: Option<String>,
    metadata: BTreeMap<String, serde_json::Value>,
    embedding: Option<Vec<f32>>,
    mimetype: Option<String>,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document ID.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the document content.
    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Add metadata to the document.
    pub fn metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the document embedding.
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Set the MIME type; the modality is derived from it.
    pub fn mimetype<S: Into<String>>(mut self, mimetype: S) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Build the document. Missing content becomes an empty document.
    pub fn build(self) -> Document {
        let mimetype = self.mimetype.unwrap_or_else(|| "text/plain".to_string());
        Document {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            content: self.content.unwrap_or_default(),
            metadata: self.metadata,
            embedding: self.embedding,
            modality: ModalityType::from_mimetype(&mimetype),
            mimetype,
        }
    }
}

//! Prelude module for convenient imports.
//!
//! ```rust
//! use sluice_core::prelude::*;
//!
//! let doc = Document::new("Hello, world!");
//! ```

pub use crate::error::{Result, SluiceError};

pub use crate::types::{
    ChunkInfo, Document, DocumentBuilder, MetadataMode, ModalityType, Node, NodeBuilder,
};

pub use crate::traits::{
    DocumentStore, KVStore, Loader, RefDocInfo, TransformComponent, TransformIdentity,
    TransformOptions, VectorStore, VectorStoreMap,
};

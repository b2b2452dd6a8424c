//! # Sluice Core
//!
//! Core traits, types, and interfaces for the Sluice ingestion pipeline.
//!
//! - **Data structures**: [`Document`], [`Node`], [`ModalityType`]
//! - **Collaborator traits**: [`Loader`], [`TransformComponent`],
//!   [`DocumentStore`], [`VectorStore`], [`KVStore`]
//! - **Error handling**: [`SluiceError`] and the [`Result`] alias
//!
//! ## Quick Start
//!
//! ```rust
//! use sluice_core::prelude::*;
//!
//! let doc = Document::builder()
//!     .content("This is a sample document")
//!     .metadata("source", "example.txt")
//!     .build();
//! let node = Node::from(doc);
//! assert_eq!(node.modality, ModalityType::Text);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude;

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, SluiceError};
pub use types::{ChunkInfo, Document, MetadataMode, ModalityType, Node};

pub use traits::*;

/// Version information for the Sluice core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Sluice - document ingestion pipelines
//!
//! Sluice runs batches of documents through an ordered list of
//! transformation stages, skipping content it has already ingested, reusing
//! cached stage results, and writing the embedded output to destination
//! stores by modality.
//!
//! ## Quick Start
//!
//! ```rust
//! use sluice::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemoryVectorStore::unbounded());
//! let pipeline = IngestionPipeline::builder()
//!     .with_transformation(Arc::new(MetadataExtractor::new()))
//!     .with_vector_store(store)
//!     .build()
//!     .unwrap();
//!
//! let nodes = pipeline
//!     .run(
//!         IngestionRunArgs::new().with_documents(vec![Document::new("# Title\nbody")]),
//!         &TransformOptions::default(),
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(nodes.len(), 1);
//! # });
//! ```
//!
//! ## Architecture
//!
//! - **sluice-core**: Core traits, types, and errors
//! - **sluice-ingestion**: Cache, deduplication, runner and pipeline
//! - **sluice-integrations**: In-memory stores

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use sluice_core as core;
pub use sluice_ingestion as ingestion;
pub use sluice_integrations as integrations;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits
/// from all Sluice crates.
pub mod prelude {
    pub use sluice_core::prelude::*;

    pub use sluice_ingestion::prelude::*;

    pub use sluice_integrations::{InMemoryKVStore, InMemoryVectorStore, KVDocumentStore};
}

/// Version information for Sluice.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

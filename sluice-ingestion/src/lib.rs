//! Cached, deduplicating ingestion for the Sluice pipeline.
//!
//! This crate turns documents and nodes into embedded nodes ready for
//! storage. It includes:
//!
//! - **Cache**: stage-level result cache keyed by a fingerprint of the input
//!   nodes and the stage's identity
//! - **Strategies**: deduplication against a tracking store, run before the
//!   stages
//! - **Pipeline**: the transformation runner, modality fan-out to
//!   destination stores, and the [`IngestionPipeline`](pipeline::IngestionPipeline)
//!   that ties them together
//! - **Transformers**: reference stages
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sluice_ingestion::prelude::*;
//! use sluice_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pipeline = IngestionPipeline::builder()
//!         .with_transformation(Arc::new(MetadataExtractor::new()))
//!         .with_num_workers(1)
//!         .build()?;
//!
//!     let nodes = pipeline
//!         .run(
//!             IngestionRunArgs::new().with_documents(vec![Document::new("# Hello\nworld")]),
//!             &TransformOptions::default(),
//!         )
//!         .await?;
//!
//!     println!("Produced {} nodes", nodes.len());
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod pipeline;
pub mod strategies;
pub mod transformers;

pub use crate::transformers::MetadataExtractor;

/// Re-export commonly used types and traits.
pub mod prelude {
    pub use crate::error::{IngestionError, Result as IngestionResult};

    pub use crate::cache::{
        CacheBackend, CacheEntry, CacheStats, IngestionCache, SimpleCacheBackend,
        TransformationHasher,
    };

    pub use crate::strategies::{DedupStrategy, DocstoreStrategy};

    pub use crate::pipeline::{
        add_nodes_to_vector_stores, run_transformations, IngestionConfig, IngestionPipeline,
        IngestionPipelineBuilder, IngestionRunArgs, NodesAddedCallback, RunTransformationsArgs,
    };

    pub use crate::transformers::{MetadataConfig, MetadataExtractor};
}

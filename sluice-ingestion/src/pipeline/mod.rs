//! Transformation runner, destination fan-out and the ingestion pipeline.

pub mod config;
pub mod fanout;
pub mod ingestion;
pub mod runner;

pub use config::IngestionConfig;
pub use fanout::{add_nodes_to_vector_stores, NodesAddedCallback};
pub use ingestion::{
    IngestionPipeline, IngestionPipelineBuilder, IngestionRunArgs, DEFAULT_CACHE_NAME,
    DEFAULT_DOCSTORE_NAME,
};
pub use runner::{run_transformations, RunTransformationsArgs};

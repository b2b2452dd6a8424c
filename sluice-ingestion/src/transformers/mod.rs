//! Reference transformation stages.

pub mod metadata_extractor;

pub use metadata_extractor::{MetadataConfig, MetadataExtractor};

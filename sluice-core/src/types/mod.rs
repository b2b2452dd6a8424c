//! Core data types for the Sluice pipeline.

pub mod document;
pub mod modality;
pub mod node;

pub use document::*;
pub use modality::*;
pub use node::*;

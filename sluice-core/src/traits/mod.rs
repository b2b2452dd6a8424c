//! Collaborator traits for the Sluice pipeline.
//!
//! The pipeline core only orchestrates; stages, readers, tracking stores and
//! destination stores all plug in through these traits.

pub mod docstore;
pub mod kvstore;
pub mod loader;
pub mod storage;
pub mod transformer;

pub use docstore::*;
pub use kvstore::*;
pub use loader::*;
pub use storage::*;
pub use transformer::*;

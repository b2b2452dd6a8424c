//! Tracking store implementations built on a [`KVStore`](sluice_core::traits::KVStore).

pub mod keyval_docstore;

pub use keyval_docstore::{KVDocumentStore, DEFAULT_NAMESPACE};

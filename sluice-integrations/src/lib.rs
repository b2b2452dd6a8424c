//! In-memory collaborators for Sluice.
//!
//! This crate provides key-value, tracking and destination stores that keep
//! everything in memory, optionally persisted as JSON files.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod storage;
pub mod vector_stores;

pub use storage::{docstore::KVDocumentStore, kvstore::InMemoryKVStore};
pub use vector_stores::InMemoryVectorStore;

//! Key-value store implementations.

pub mod memory;

pub use memory::InMemoryKVStore;

pub use sluice_core::traits::{KVStore, DEFAULT_COLLECTION};

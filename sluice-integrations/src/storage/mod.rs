//! Key-value and tracking stores.

pub mod docstore;
pub mod kvstore;

//! Stage-level result caching.

pub mod ingestion_cache;

pub use ingestion_cache::{
    CacheBackend, CacheEntry, CacheStats, IngestionCache, SimpleCacheBackend,
    TransformationHasher, DEFAULT_CACHE_COLLECTION,
};

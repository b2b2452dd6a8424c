//! Error types for the ingestion crate.

use thiserror::Error;

/// Errors raised by the ingestion cache and pipeline persistence.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// IO error while reading or writing persisted state.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache entries could not be (de)serialized.
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cache backend failure.
    #[error("Cache error: {message}")]
    Cache {
        /// Error message describing the cache issue.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Core framework error.
    #[error("Core error: {0}")]
    Core(#[from] sluice_core::SluiceError),
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;

impl IngestionError {
    /// Create a new cache error.
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

// Core errors travel through unchanged; everything else maps onto the
// closest core variant.
impl From<IngestionError> for sluice_core::SluiceError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Io(e) => Self::Io(e),
            IngestionError::Serialization(e) => Self::Serialization(e),
            IngestionError::Core(e) => e,
            IngestionError::Configuration { message } => Self::Configuration { message },
            IngestionError::Cache { message } => Self::storage(message),
        }
    }
}

//! Error types for the Sluice pipeline.
//!
//! Collaborator failures (stages, readers, stores) travel through the
//! pipeline untouched; the only error the orchestration layer raises on its
//! own is [`SluiceError::MissingVectorStore`] plus configuration validation.

use thiserror::Error;

use crate::types::ModalityType;

/// Core error types for the Sluice pipeline.
#[derive(Error, Debug)]
pub enum SluiceError {
    /// I/O related errors (file reading, cache persistence, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tracking store or key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Destination store errors
    #[error("Vector store error: {message}")]
    VectorStore {
        /// Detailed error message
        message: String,
    },

    /// No destination store is registered for a modality present in the batch.
    #[error("Cannot insert nodes of type {modality} without assigned vector store")]
    MissingVectorStore {
        /// The modality that has no store.
        modality: ModalityType,
    },

    /// Pipeline execution errors
    #[error("Pipeline error: {message}")]
    Pipeline {
        /// Detailed error message
        message: String,
    },

    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Configuration {
        /// Detailed error message
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed error message
        message: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Detailed error message
        message: String,
    },

    /// Errors raised by external collaborators
    #[error("External error: {source}")]
    External {
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },
}

impl SluiceError {
    /// Create a new storage error with a message.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage(message.into())
    }

    /// Create a new vector store error with a message.
    pub fn vector_store<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
        }
    }

    /// Create a new pipeline error with a message.
    pub fn pipeline<S: Into<String>>(message: S) -> Self {
        Self::Pipeline {
            message: message.into(),
        }
    }

    /// Create a new configuration error with a message.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new validation error with a message.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new internal error with a message.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new external error from anything convertible into `anyhow::Error`.
    pub fn external<E: Into<anyhow::Error>>(error: E) -> Self {
        Self::External {
            source: error.into(),
        }
    }

    /// Check if this error is caused by pipeline configuration rather than
    /// a failing collaborator.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Configuration { .. }
                | Self::MissingVectorStore { .. }
        )
    }
}

impl From<anyhow::Error> for SluiceError {
    fn from(error: anyhow::Error) -> Self {
        Self::External { source: error }
    }
}

/// Result type alias used throughout Sluice.
pub type Result<T> = std::result::Result<T, SluiceError>;

//! Transformation stage interface.
//!
//! Every stage the pipeline runs, including the deduplication pre-pass,
//! implements [`TransformComponent`]: an async function from a node sequence
//! to a node sequence, plus an [`identity`](TransformComponent::identity)
//! that the result cache fingerprints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Node, Result};

/// Per-run options handed to every stage.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Whether stages should log progress.
    pub show_progress: bool,

    /// Stage-specific options, passed through untouched.
    pub additional: HashMap<String, serde_json::Value>,
}

impl TransformOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable progress logging.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Add a stage-specific option.
    #[must_use]
    pub fn with_option<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.additional.insert(key.into(), value.into());
        self
    }
}

/// Identity of a stage as seen by the result cache.
///
/// Includes both the kind of stage and its configuration, so two differently
/// configured instances of the same stage never share cache entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformIdentity {
    /// Stage kind.
    pub kind: String,
    /// Stage configuration.
    pub config: serde_json::Value,
}

/// A transformation stage.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use sluice_core::traits::{TransformComponent, TransformOptions};
/// use sluice_core::{Node, Result};
///
/// #[derive(Debug)]
/// struct Uppercase;
///
/// #[async_trait]
/// impl TransformComponent for Uppercase {
///     async fn transform(&self, mut nodes: Vec<Node>, _options: &TransformOptions) -> Result<Vec<Node>> {
///         for node in &mut nodes {
///             node.content = node.content.to_uppercase();
///         }
///         Ok(nodes)
///     }
/// }
/// ```
#[async_trait]
pub trait TransformComponent: Send + Sync + std::fmt::Debug {
    /// Transform a node sequence into a new node sequence.
    ///
    /// # Errors
    ///
    /// Any error is propagated unchanged to the pipeline caller.
    async fn transform(&self, nodes: Vec<Node>, options: &TransformOptions) -> Result<Vec<Node>>;

    /// Get a human-readable name for this stage.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Configuration of this stage. Anything that influences the output must
    /// appear here, or stale cache entries will be served after it changes.
    fn config(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Identity used for cache fingerprinting.
    fn identity(&self) -> TransformIdentity {
        TransformIdentity {
            kind: self.name().to_string(),
            config: self.config(),
        }
    }
}

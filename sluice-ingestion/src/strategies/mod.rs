//! Deduplication strategies run before the main transformation stages.
//!
//! A strategy is built once from a [`DocstoreStrategy`] kind, a tracking
//! store and the destination stores, and then behaves like any other stage:
//! nodes in, the subset still needing work out.

mod duplicates;
mod upserts;

pub use duplicates::DuplicatesOnlyStrategy;
pub use upserts::UpsertsStrategy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_core::{
    traits::{DocumentStore, TransformComponent, TransformOptions, VectorStoreMap},
    Node, Result,
};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::warn;

/// How previously ingested content is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocstoreStrategy {
    /// Pass every node through and leave the tracking store untouched.
    None,
    /// Skip nodes whose content hash has been seen before.
    DuplicatesOnly,
    /// Skip unchanged reference documents, re-ingest changed ones.
    #[default]
    Upserts,
    /// Like [`Upserts`](Self::Upserts), and also remove reference documents
    /// missing from the input.
    UpsertsAndDelete,
}

impl DocstoreStrategy {
    /// Name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DuplicatesOnly => "duplicates_only",
            Self::Upserts => "upserts",
            Self::UpsertsAndDelete => "upserts_and_delete",
        }
    }
}

impl fmt::Display for DocstoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocstoreStrategy {
    type Err = sluice_core::SluiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "duplicates_only" => Ok(Self::DuplicatesOnly),
            "upserts" => Ok(Self::Upserts),
            "upserts_and_delete" => Ok(Self::UpsertsAndDelete),
            other => Err(sluice_core::SluiceError::configuration(format!(
                "Unknown docstore strategy: {other}"
            ))),
        }
    }
}

/// A built deduplication pre-pass.
#[derive(Debug, Clone)]
pub enum DedupStrategy {
    /// Identity pass.
    NoOp,
    /// Drop content already seen.
    DuplicatesOnly(DuplicatesOnlyStrategy),
    /// Per reference document upserts, optionally deleting missing documents.
    Upserts(UpsertsStrategy),
}

impl DedupStrategy {
    /// Build the strategy for `kind`.
    ///
    /// Without a tracking store there is nothing to deduplicate against and
    /// [`DedupStrategy::NoOp`] is returned whatever `kind` says.
    pub fn create(
        kind: DocstoreStrategy,
        docstore: Option<Arc<dyn DocumentStore>>,
        vector_stores: &VectorStoreMap,
    ) -> Self {
        let Some(docstore) = docstore else {
            if kind != DocstoreStrategy::None {
                warn!(
                    "No docstore configured, falling back from '{}' to 'none'",
                    kind
                );
            }
            return Self::NoOp;
        };

        match kind {
            DocstoreStrategy::None => Self::NoOp,
            DocstoreStrategy::DuplicatesOnly => {
                Self::DuplicatesOnly(DuplicatesOnlyStrategy::new(docstore))
            }
            DocstoreStrategy::Upserts => {
                Self::Upserts(UpsertsStrategy::new(docstore, vector_stores.stores()))
            }
            DocstoreStrategy::UpsertsAndDelete => Self::Upserts(
                UpsertsStrategy::new(docstore, vector_stores.stores()).with_delete_missing(true),
            ),
        }
    }

    /// The kind this strategy was built as.
    pub fn kind(&self) -> DocstoreStrategy {
        match self {
            Self::NoOp => DocstoreStrategy::None,
            Self::DuplicatesOnly(_) => DocstoreStrategy::DuplicatesOnly,
            Self::Upserts(strategy) if strategy.deletes_missing() => {
                DocstoreStrategy::UpsertsAndDelete
            }
            Self::Upserts(_) => DocstoreStrategy::Upserts,
        }
    }
}

#[async_trait]
impl TransformComponent for DedupStrategy {
    async fn transform(&self, nodes: Vec<Node>, options: &TransformOptions) -> Result<Vec<Node>> {
        match self {
            Self::NoOp => Ok(nodes),
            Self::DuplicatesOnly(strategy) => strategy.apply(nodes, options).await,
            Self::Upserts(strategy) => strategy.apply(nodes, options).await,
        }
    }

    fn name(&self) -> &'static str {
        "DedupStrategy"
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({ "strategy": self.kind().as_str() })
    }
}

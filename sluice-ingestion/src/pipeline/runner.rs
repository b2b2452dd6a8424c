//! Applies transformation stages to a node sequence.
//!
//! Two modes are supported:
//!
//! - **Sequential** (`num_workers <= 1`): each stage consumes the previous
//!   stage's output.
//! - **Parallel** (`num_workers > 1`): every stage consumes the same input,
//!   at most `num_workers` at a time, and the outputs are concatenated in
//!   stage order. Only stage sets whose members do not depend on each other
//!   produce meaningful results this way.
//!
//! In both modes each stage is looked up in the cache by a fingerprint of its
//! input and identity before it is run.

use futures::future::join_all;
use sluice_core::{
    traits::{TransformComponent, TransformOptions},
    Node, Result, SluiceError,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::cache::{IngestionCache, TransformationHasher};

/// Optional knobs for [`run_transformations`].
#[derive(Debug, Clone)]
pub struct RunTransformationsArgs<'a> {
    /// Result cache consulted per stage.
    pub cache: Option<&'a IngestionCache>,
    /// Deduplication pass run once before the stages. Never cached.
    pub docstore_strategy: Option<Arc<dyn TransformComponent>>,
    /// Number of stages allowed in flight at once.
    pub num_workers: usize,
}

impl Default for RunTransformationsArgs<'_> {
    fn default() -> Self {
        Self {
            cache: None,
            docstore_strategy: None,
            num_workers: 1,
        }
    }
}

/// Run `stages` over `nodes`.
///
/// # Errors
///
/// The first failing stage's error (in stage order) is returned unchanged.
/// In parallel mode every dispatched stage still runs to completion, and
/// cache entries written by stages that succeeded are kept.
pub async fn run_transformations(
    nodes: Vec<Node>,
    stages: &[Arc<dyn TransformComponent>],
    options: &TransformOptions,
    args: RunTransformationsArgs<'_>,
) -> Result<Vec<Node>> {
    let mut nodes = nodes;

    if let Some(strategy) = &args.docstore_strategy {
        nodes = strategy.transform(nodes, options).await?;
    }

    if args.num_workers > 1 {
        run_parallel(nodes, stages, options, args.cache, args.num_workers).await
    } else {
        run_sequential(nodes, stages, options, args.cache).await
    }
}

async fn run_sequential(
    mut nodes: Vec<Node>,
    stages: &[Arc<dyn TransformComponent>],
    options: &TransformOptions,
    cache: Option<&IngestionCache>,
) -> Result<Vec<Node>> {
    for (i, stage) in stages.iter().enumerate() {
        if options.show_progress {
            info!(
                "Applying transformation {}/{}: {}",
                i + 1,
                stages.len(),
                stage.name()
            );
        }

        nodes = run_cached(nodes, stage.as_ref(), options, cache).await?;

        if options.show_progress {
            info!(
                "Completed transformation '{}': {} nodes",
                stage.name(),
                nodes.len()
            );
        }
    }
    Ok(nodes)
}

async fn run_parallel(
    nodes: Vec<Node>,
    stages: &[Arc<dyn TransformComponent>],
    options: &TransformOptions,
    cache: Option<&IngestionCache>,
    num_workers: usize,
) -> Result<Vec<Node>> {
    let semaphore = Semaphore::new(num_workers.min(Semaphore::MAX_PERMITS));
    let input = &nodes;
    let semaphore = &semaphore;

    if options.show_progress {
        info!(
            "Applying {} transformations with {} workers",
            stages.len(),
            num_workers
        );
    }

    let runs = stages.iter().map(|stage| async move {
        let _permit = semaphore
            .acquire()
            .await
            .map_err(|e| SluiceError::internal(format!("Worker pool closed: {e}")))?;
        run_cached(input.clone(), stage.as_ref(), options, cache).await
    });
    let results = join_all(runs).await;

    let mut output = Vec::new();
    for result in results {
        output.extend(result?);
    }

    if options.show_progress {
        info!("Completed parallel transformations: {} nodes", output.len());
    }
    Ok(output)
}

async fn run_cached(
    nodes: Vec<Node>,
    stage: &dyn TransformComponent,
    options: &TransformOptions,
    cache: Option<&IngestionCache>,
) -> Result<Vec<Node>> {
    let Some(cache) = cache else {
        return stage.transform(nodes, options).await;
    };

    let key = TransformationHasher::hash(&nodes, &stage.identity());
    if let Some(cached) = cache.get(&key).await? {
        debug!("Using cached output for '{}'", stage.name());
        return Ok(cached);
    }

    let output = stage.transform(nodes, options).await?;
    cache.put(&key, output.clone()).await?;
    Ok(output)
}

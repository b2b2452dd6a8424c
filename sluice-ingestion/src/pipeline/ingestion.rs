//! Ingestion pipeline façade.
//!
//! Gathers input from the configured sources, runs deduplication and the
//! transformation stages through the cache, and hands embedded nodes to the
//! destination stores.

use std::{fmt, path::Path, sync::Arc};
use tracing::{info, warn};

use sluice_core::{
    traits::{
        DocumentStore, Loader, TransformComponent, TransformOptions, VectorStore, VectorStoreMap,
    },
    Document, Node, Result,
};

use super::{
    config::IngestionConfig,
    fanout::{add_nodes_to_vector_stores, NodesAddedCallback},
    runner::{run_transformations, RunTransformationsArgs},
};
use crate::{
    cache::IngestionCache,
    strategies::{DedupStrategy, DocstoreStrategy},
};

/// Default file name of the persisted cache.
pub const DEFAULT_CACHE_NAME: &str = "cache.json";

/// Default file name of the persisted docstore.
pub const DEFAULT_DOCSTORE_NAME: &str = "docstore.json";

/// Per-run inputs and overrides for [`IngestionPipeline::run`].
#[derive(Default)]
pub struct IngestionRunArgs {
    /// Documents to ingest in addition to the pipeline's own sources.
    pub documents: Option<Vec<Document>>,
    /// Nodes to ingest in addition to the pipeline's own sources.
    pub nodes: Option<Vec<Node>>,
    /// Cache used instead of the pipeline's cache for this run.
    pub cache: Option<IngestionCache>,
    /// Deduplication pass used instead of the pipeline's for this run.
    pub docstore_strategy: Option<Arc<dyn TransformComponent>>,
    /// Worker count used instead of the configured one for this run.
    pub num_workers: Option<usize>,
}

impl IngestionRunArgs {
    /// Create empty run arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest these documents.
    #[must_use]
    pub fn with_documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Ingest these nodes.
    #[must_use]
    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Use `cache` for this run.
    #[must_use]
    pub fn with_cache(mut self, cache: IngestionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use `strategy` as the deduplication pass for this run.
    #[must_use]
    pub fn with_docstore_strategy(mut self, strategy: Arc<dyn TransformComponent>) -> Self {
        self.docstore_strategy = Some(strategy);
        self
    }

    /// Use `num_workers` for this run.
    #[must_use]
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }
}

/// Ingestion pipeline.
///
/// # Usage
///
/// ```rust,no_run
/// use sluice_ingestion::pipeline::{IngestionPipeline, IngestionRunArgs};
/// use sluice_ingestion::transformers::MetadataExtractor;
/// use sluice_core::prelude::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<()> {
/// let pipeline = IngestionPipeline::builder()
///     .with_transformation(Arc::new(MetadataExtractor::new()))
///     .build()?;
///
/// let documents = vec![Document::new("Sample text")];
/// let nodes = pipeline
///     .run(
///         IngestionRunArgs::new().with_documents(documents),
///         &TransformOptions::default(),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct IngestionPipeline {
    /// Transformation stages, applied in order.
    pub transformations: Vec<Arc<dyn TransformComponent>>,
    /// Documents bound to the pipeline, ingested on every run.
    pub documents: Option<Vec<Document>>,
    /// Reader loaded on every run.
    pub reader: Option<Arc<dyn Loader>>,
    /// Destination stores by modality.
    pub vector_stores: VectorStoreMap,
    /// Tracking store used for deduplication.
    pub docstore: Option<Arc<dyn DocumentStore>>,
    /// Result cache, absent when caching is disabled.
    pub cache: Option<IngestionCache>,
    /// Pipeline configuration.
    pub config: IngestionConfig,
    dedup: Arc<DedupStrategy>,
    nodes_added: Option<NodesAddedCallback>,
}

impl fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("transformations", &self.transformations)
            .field("reader", &self.reader)
            .field("vector_stores", &self.vector_stores)
            .field("docstore", &self.docstore)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("dedup", &self.dedup)
            .finish_non_exhaustive()
    }
}

impl IngestionPipeline {
    /// Create a new ingestion pipeline builder.
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::new()
    }

    /// Name of the pipeline.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The deduplication strategy in effect, after the docstore fallback.
    pub fn docstore_strategy(&self) -> DocstoreStrategy {
        self.dedup.kind()
    }

    /// Run the pipeline.
    ///
    /// Input is gathered in a fixed order: `args.documents`, `args.nodes`,
    /// the pipeline's documents, then the reader's output. The full
    /// transformed sequence is returned; only nodes carrying an embedding
    /// are written to the destination stores.
    ///
    /// # Errors
    ///
    /// Reader, stage, tracking store and destination store errors are
    /// returned unchanged. A node modality without a destination store
    /// fails with [`SluiceError::MissingVectorStore`](sluice_core::SluiceError::MissingVectorStore).
    pub async fn run(&self, args: IngestionRunArgs, options: &TransformOptions) -> Result<Vec<Node>> {
        let start_time = std::time::Instant::now();
        let options = options
            .clone()
            .with_progress(options.show_progress || self.config.show_progress);

        if options.show_progress {
            info!("Starting ingestion pipeline: {}", self.config.name);
        }

        let IngestionRunArgs {
            documents,
            nodes,
            cache,
            docstore_strategy,
            num_workers,
        } = args;

        let cache = cache.as_ref().or(self.cache.as_ref());
        let docstore_strategy = docstore_strategy
            .unwrap_or_else(|| Arc::clone(&self.dedup) as Arc<dyn TransformComponent>);
        let num_workers = num_workers.unwrap_or(self.config.num_workers);

        let input = self.prepare_input(documents, nodes).await?;
        if options.show_progress {
            info!("Processing {} input nodes", input.len());
        }

        let nodes = run_transformations(
            input,
            &self.transformations,
            &options,
            RunTransformationsArgs {
                cache,
                docstore_strategy: Some(docstore_strategy),
                num_workers,
            },
        )
        .await?;

        if !self.vector_stores.is_empty() {
            let embedded: Vec<Node> = nodes.iter().filter(|n| n.has_embedding()).cloned().collect();
            if !embedded.is_empty() {
                if options.show_progress {
                    info!("Storing {} nodes in vector stores", embedded.len());
                }
                add_nodes_to_vector_stores(embedded, &self.vector_stores, self.nodes_added.as_ref())
                    .await?;
            }
        }

        if options.show_progress {
            info!(
                "Ingestion completed in {:?}, produced {} nodes",
                start_time.elapsed(),
                nodes.len()
            );
        }

        Ok(nodes)
    }

    async fn prepare_input(
        &self,
        documents: Option<Vec<Document>>,
        nodes: Option<Vec<Node>>,
    ) -> Result<Vec<Node>> {
        let mut input: Vec<Node> = Vec::new();

        if let Some(documents) = documents {
            input.extend(documents.into_iter().map(Node::from));
        }
        if let Some(nodes) = nodes {
            input.extend(nodes);
        }
        if let Some(documents) = &self.documents {
            input.extend(documents.iter().cloned().map(Node::from));
        }
        if let Some(reader) = &self.reader {
            let loaded = reader.load().await?;
            info!("Loaded {} documents from {}", loaded.len(), reader.name());
            input.extend(loaded.into_iter().map(Node::from));
        }

        if input.is_empty() {
            warn!("No documents or nodes provided");
        }
        Ok(input)
    }

    /// Persist the cache and docstore under `persist_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or either store
    /// fails to write.
    pub async fn persist<P: AsRef<Path>>(
        &self,
        persist_dir: P,
        cache_name: Option<&str>,
        docstore_name: Option<&str>,
    ) -> Result<()> {
        let persist_path = persist_dir.as_ref();
        tokio::fs::create_dir_all(persist_path).await?;

        if let Some(cache) = &self.cache {
            let cache_path = persist_path.join(cache_name.unwrap_or(DEFAULT_CACHE_NAME));
            cache.persist(&cache_path).await?;
        }

        if let Some(docstore) = &self.docstore {
            let docstore_path = persist_path.join(docstore_name.unwrap_or(DEFAULT_DOCSTORE_NAME));
            docstore.persist(&docstore_path).await?;
            info!("Persisted docstore to: {}", docstore_path.display());
        }

        Ok(())
    }

    /// Load the cache and docstore from `persist_dir`. Missing files are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read.
    pub async fn load<P: AsRef<Path>>(
        &self,
        persist_dir: P,
        cache_name: Option<&str>,
        docstore_name: Option<&str>,
    ) -> Result<()> {
        let persist_path = persist_dir.as_ref();

        if let Some(cache) = &self.cache {
            let cache_path = persist_path.join(cache_name.unwrap_or(DEFAULT_CACHE_NAME));
            if tokio::fs::try_exists(&cache_path).await? {
                cache.load(&cache_path).await?;
            }
        }

        if let Some(docstore) = &self.docstore {
            let docstore_path = persist_path.join(docstore_name.unwrap_or(DEFAULT_DOCSTORE_NAME));
            if tokio::fs::try_exists(&docstore_path).await? {
                docstore.load(&docstore_path).await?;
                info!("Loaded docstore from: {}", docstore_path.display());
            }
        }

        Ok(())
    }
}

/// Builder for [`IngestionPipeline`].
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    name: Option<String>,
    transformations: Vec<Arc<dyn TransformComponent>>,
    documents: Option<Vec<Document>>,
    reader: Option<Arc<dyn Loader>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    vector_stores: Option<VectorStoreMap>,
    docstore: Option<Arc<dyn DocumentStore>>,
    cache: Option<IngestionCache>,
    config: Option<IngestionConfig>,
    nodes_added: Option<NodesAddedCallback>,
}

impl IngestionPipelineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pipeline name.
    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the transformations.
    #[must_use]
    pub fn with_transformations(mut self, transformations: Vec<Arc<dyn TransformComponent>>) -> Self {
        self.transformations = transformations;
        self
    }

    /// Add a single transformation.
    #[must_use]
    pub fn with_transformation(mut self, transformation: Arc<dyn TransformComponent>) -> Self {
        self.transformations.push(transformation);
        self
    }

    /// Bind documents to the pipeline.
    #[must_use]
    pub fn with_documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Set the reader.
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn Loader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Set a single vector store. Unless a full map is also given, it
    /// receives text nodes only.
    #[must_use]
    pub fn with_vector_store(mut self, vector_store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(vector_store);
        self
    }

    /// Set the vector stores by modality.
    #[must_use]
    pub fn with_vector_stores(mut self, vector_stores: VectorStoreMap) -> Self {
        self.vector_stores = Some(vector_stores);
        self
    }

    /// Set the document store.
    #[must_use]
    pub fn with_docstore(mut self, docstore: Arc<dyn DocumentStore>) -> Self {
        self.docstore = Some(docstore);
        self
    }

    /// Set the ingestion cache.
    #[must_use]
    pub fn with_cache(mut self, cache: IngestionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: IngestionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the deduplication strategy.
    #[must_use]
    pub fn with_docstore_strategy(mut self, strategy: DocstoreStrategy) -> Self {
        self.config.get_or_insert_with(IngestionConfig::default).docstore_strategy = strategy;
        self
    }

    /// Set the number of workers.
    #[must_use]
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.config.get_or_insert_with(IngestionConfig::default).num_workers = num_workers;
        self
    }

    /// Disable the result cache.
    #[must_use]
    pub fn disable_cache(mut self) -> Self {
        self.config.get_or_insert_with(IngestionConfig::default).disable_cache = true;
        self
    }

    /// Observe every destination store insert.
    #[must_use]
    pub fn with_nodes_added(mut self, callback: NodesAddedCallback) -> Self {
        self.nodes_added = Some(callback);
        self
    }

    /// Build the ingestion pipeline.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration does not validate.
    pub fn build(self) -> Result<IngestionPipeline> {
        let mut config = self.config.unwrap_or_default();
        if let Some(name) = self.name {
            config.name = name;
        }
        config.validate()?;

        let vector_stores = match (self.vector_stores, self.vector_store) {
            (Some(map), _) => map,
            (None, Some(store)) => VectorStoreMap::text_only(store),
            (None, None) => VectorStoreMap::new(),
        };

        let cache = if config.disable_cache {
            None
        } else {
            let mut cache = self.cache.unwrap_or_else(IngestionCache::simple);
            if let Some(collection) = &config.cache_collection {
                cache = cache.with_collection(collection.clone());
            }
            if let Some(ttl) = config.cache_ttl() {
                cache = cache.with_ttl(ttl);
            }
            Some(cache)
        };

        let dedup = DedupStrategy::create(
            config.docstore_strategy,
            self.docstore.clone(),
            &vector_stores,
        );

        Ok(IngestionPipeline {
            transformations: self.transformations,
            documents: self.documents,
            reader: self.reader,
            vector_stores,
            docstore: self.docstore,
            cache,
            config,
            dedup: Arc::new(dedup),
            nodes_added: self.nodes_added,
        })
    }
}

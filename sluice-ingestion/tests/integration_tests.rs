//! Integration tests for the sluice-ingestion crate.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use sluice_core::{
    traits::{DocumentStore, TransformComponent, TransformOptions, VectorStore, VectorStoreMap},
    ChunkInfo, Document, ModalityType, Node, Result, SluiceError,
};
use sluice_ingestion::{
    pipeline::{DEFAULT_CACHE_NAME, DEFAULT_DOCSTORE_NAME},
    prelude::*,
};
use sluice_integrations::{InMemoryKVStore, InMemoryVectorStore, KVDocumentStore};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tempfile::TempDir;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic embedding stage: `[chars, words, scale]`.
#[derive(Debug)]
struct MockEmbedder {
    scale: f32,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    fn new() -> Self {
        Self::with_scale(1.0)
    }

    fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransformComponent for MockEmbedder {
    async fn transform(&self, nodes: Vec<Node>, _options: &TransformOptions) -> Result<Vec<Node>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(nodes
            .into_iter()
            .map(|node| {
                let embedding = vec![
                    node.content.chars().count() as f32,
                    node.content.split_whitespace().count() as f32,
                    self.scale,
                ];
                node.with_embedding(embedding)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "MockEmbedder"
    }

    fn config(&self) -> serde_json::Value {
        json!({ "scale": self.scale })
    }
}

#[derive(Debug)]
struct Append(&'static str);

#[async_trait]
impl TransformComponent for Append {
    async fn transform(&self, nodes: Vec<Node>, _options: &TransformOptions) -> Result<Vec<Node>> {
        Ok(nodes
            .into_iter()
            .map(|mut node| {
                node.content.push_str(self.0);
                node
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "Append"
    }

    fn config(&self) -> serde_json::Value {
        json!({ "suffix": self.0 })
    }
}

#[derive(Debug)]
struct Uppercase;

#[async_trait]
impl TransformComponent for Uppercase {
    async fn transform(&self, nodes: Vec<Node>, _options: &TransformOptions) -> Result<Vec<Node>> {
        Ok(nodes
            .into_iter()
            .map(|mut node| {
                node.content = node.content.to_uppercase();
                node
            })
            .collect())
    }
}

fn text_nodes(contents: &[&str]) -> Vec<Node> {
    let doc_id = Uuid::new_v4();
    contents
        .iter()
        .enumerate()
        .map(|(i, c)| Node::new(*c, doc_id, ChunkInfo::new(None, None, i)))
        .collect()
}

fn contents(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.content.clone()).collect()
}

fn docstore() -> Arc<KVDocumentStore> {
    Arc::new(KVDocumentStore::new(Arc::new(InMemoryKVStore::new()), None))
}

#[tokio::test]
async fn test_end_to_end_text_nodes() {
    init_tracing();
    let store = Arc::new(InMemoryVectorStore::new(3));
    let pipeline = IngestionPipeline::builder()
        .with_transformation(Arc::new(MockEmbedder::new()))
        .with_vector_store(store.clone())
        .disable_cache()
        .build()
        .unwrap();

    let nodes = pipeline
        .run(
            IngestionRunArgs::new().with_nodes(text_nodes(&["alpha", "beta gamma", "delta"])),
            &TransformOptions::default().with_progress(true),
        )
        .await
        .unwrap();

    assert_eq!(nodes.len(), 3);
    assert!(nodes.iter().all(Node::has_embedding));
    assert_eq!(store.add_batches().await, vec![3]);
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_non_embedded_nodes_are_returned_but_not_stored() {
    let store = Arc::new(InMemoryVectorStore::unbounded());
    let pipeline = IngestionPipeline::builder()
        .with_transformation(Arc::new(Append("!")))
        .with_vector_store(store.clone())
        .build()
        .unwrap();

    let nodes = pipeline
        .run(
            IngestionRunArgs::new().with_nodes(text_nodes(&["a", "b"])),
            &TransformOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(contents(&nodes), vec!["a!", "b!"]);
    assert!(store.add_batches().await.is_empty());
}

#[tokio::test]
async fn test_cache_is_transparent() {
    let input = text_nodes(&["one", "two words", "three"]);

    let uncached = IngestionPipeline::builder()
        .with_transformations(vec![Arc::new(Append("-x")), Arc::new(MockEmbedder::new())])
        .disable_cache()
        .build()
        .unwrap();
    let cached = IngestionPipeline::builder()
        .with_transformations(vec![Arc::new(Append("-x")), Arc::new(MockEmbedder::new())])
        .build()
        .unwrap();

    let expected = uncached
        .run(
            IngestionRunArgs::new().with_nodes(input.clone()),
            &TransformOptions::default(),
        )
        .await
        .unwrap();

    for _ in 0..2 {
        let out = cached
            .run(
                IngestionRunArgs::new().with_nodes(input.clone()),
                &TransformOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(out, expected);
    }
}

#[tokio::test]
async fn test_cache_keeps_identity_and_modality_of_current_input() {
    let cache = IngestionCache::simple();
    let stages: Vec<Arc<dyn TransformComponent>> = vec![Arc::new(Append("-x"))];
    let cached = IngestionPipeline::builder()
        .with_transformations(stages.clone())
        .with_cache(cache.clone())
        .build()
        .unwrap();
    let uncached = IngestionPipeline::builder()
        .with_transformations(stages)
        .disable_cache()
        .build()
        .unwrap();

    cached
        .run(
            IngestionRunArgs::new().with_nodes(text_nodes(&["same"])),
            &TransformOptions::default(),
        )
        .await
        .unwrap();

    let image = text_nodes(&["same"])
        .into_iter()
        .map(|node| node.with_modality(ModalityType::Image))
        .collect::<Vec<_>>();
    let options = TransformOptions::default();
    let expected = uncached
        .run(IngestionRunArgs::new().with_nodes(image.clone()), &options)
        .await
        .unwrap();
    let out = cached
        .run(IngestionRunArgs::new().with_nodes(image.clone()), &options)
        .await
        .unwrap();

    assert_eq!(out, expected);
    assert_eq!(out[0].modality, ModalityType::Image);
    assert_eq!(out[0].source_document_id, image[0].source_document_id);
    assert_eq!(cache.get_all_keys().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cache_hit_skips_stage_and_config_change_misses() {
    let cache = IngestionCache::simple();
    let input = text_nodes(&["cached content"]);

    let embedder = Arc::new(MockEmbedder::new());
    let pipeline = IngestionPipeline::builder()
        .with_transformation(embedder.clone())
        .with_cache(cache.clone())
        .build()
        .unwrap();

    for _ in 0..3 {
        pipeline
            .run(
                IngestionRunArgs::new().with_nodes(input.clone()),
                &TransformOptions::default(),
            )
            .await
            .unwrap();
    }
    assert_eq!(embedder.calls(), 1);

    let rescaled = Arc::new(MockEmbedder::with_scale(2.0));
    let pipeline = IngestionPipeline::builder()
        .with_transformation(rescaled.clone())
        .with_cache(cache.clone())
        .build()
        .unwrap();
    let out = pipeline
        .run(
            IngestionRunArgs::new().with_nodes(input.clone()),
            &TransformOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(rescaled.calls(), 1);
    assert_eq!(out[0].embedding.as_ref().unwrap()[2], 2.0);
    assert_eq!(cache.get_all_keys().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_sequential_and_parallel_differ_on_dependent_stages() {
    let stages: Vec<Arc<dyn TransformComponent>> = vec![Arc::new(Append("-a")), Arc::new(Uppercase)];
    let input = text_nodes(&["n"]);

    let sequential = IngestionPipeline::builder()
        .with_transformations(stages.clone())
        .build()
        .unwrap()
        .run(
            IngestionRunArgs::new().with_nodes(input.clone()),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(contents(&sequential), vec!["N-A"]);

    let parallel = IngestionPipeline::builder()
        .with_transformations(stages)
        .with_num_workers(2)
        .build()
        .unwrap()
        .run(
            IngestionRunArgs::new().with_nodes(input),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(contents(&parallel), vec!["n-a", "N"]);
}

#[tokio::test]
async fn test_run_args_override_workers_and_cache() {
    let embedder = Arc::new(MockEmbedder::new());
    let pipeline = IngestionPipeline::builder()
        .with_transformations(vec![Arc::new(Append("-a")), embedder.clone()])
        .disable_cache()
        .build()
        .unwrap();
    let cache = IngestionCache::simple();
    let input = text_nodes(&["n"]);

    for _ in 0..2 {
        let out = pipeline
            .run(
                IngestionRunArgs::new()
                    .with_nodes(input.clone())
                    .with_num_workers(2)
                    .with_cache(cache.clone()),
                &TransformOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(contents(&out), vec!["n-a", "n"]);
    }
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn test_missing_store_fails_before_any_insert() {
    let text_store = Arc::new(InMemoryVectorStore::unbounded());
    let pipeline = IngestionPipeline::builder()
        .with_transformation(Arc::new(MockEmbedder::new()))
        .with_vector_store(text_store.clone())
        .build()
        .unwrap();

    let mut nodes = text_nodes(&["caption", "photo"]);
    nodes[1].modality = ModalityType::Image;

    let err = pipeline
        .run(IngestionRunArgs::new().with_nodes(nodes), &TransformOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SluiceError::MissingVectorStore {
            modality: ModalityType::Image
        }
    ));
    assert_eq!(
        err.to_string(),
        "Cannot insert nodes of type image without assigned vector store"
    );
    assert!(text_store.add_batches().await.is_empty());
}

#[tokio::test]
async fn test_multimodal_fan_out_with_callback() {
    let text_store = Arc::new(InMemoryVectorStore::unbounded());
    let image_store = Arc::new(InMemoryVectorStore::unbounded());
    let stores = VectorStoreMap::new()
        .with_store(ModalityType::Text, text_store.clone())
        .with_store(ModalityType::Image, image_store.clone());

    let seen: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: NodesAddedCallback = Arc::new(
        move |ids: Vec<Uuid>, _nodes: Vec<Node>, store: Arc<dyn VectorStore>| {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().unwrap().push((store.name().to_string(), ids.len()));
                Ok::<(), SluiceError>(())
            }) as futures::future::BoxFuture<'static, Result<()>>
        },
    );

    let pipeline = IngestionPipeline::builder()
        .with_transformation(Arc::new(MockEmbedder::new()))
        .with_vector_stores(stores)
        .with_nodes_added(callback)
        .build()
        .unwrap();

    let image = Document::builder()
        .content("binary-ish")
        .mimetype("image/png")
        .build();
    let text = Document::new("plain words");

    pipeline
        .run(
            IngestionRunArgs::new().with_documents(vec![image, text]),
            &TransformOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(text_store.add_batches().await, vec![1]);
    assert_eq!(image_store.add_batches().await, vec![1]);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("InMemoryVectorStore".to_string(), 1),
            ("InMemoryVectorStore".to_string(), 1)
        ]
    );
}

#[tokio::test]
async fn test_dedup_none_passes_everything() {
    let pipeline = IngestionPipeline::builder()
        .with_docstore(docstore())
        .with_docstore_strategy(DocstoreStrategy::None)
        .disable_cache()
        .build()
        .unwrap();
    let docs = vec![Document::new("same"), Document::new("same")];

    for _ in 0..2 {
        let out = pipeline
            .run(
                IngestionRunArgs::new().with_documents(docs.clone()),
                &TransformOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
    }
}

#[tokio::test]
async fn test_dedup_duplicates_only() {
    let store = docstore();
    let pipeline = IngestionPipeline::builder()
        .with_docstore(store.clone())
        .with_docstore_strategy(DocstoreStrategy::DuplicatesOnly)
        .build()
        .unwrap();
    assert_eq!(pipeline.docstore_strategy(), DocstoreStrategy::DuplicatesOnly);

    let first = pipeline
        .run(
            IngestionRunArgs::new().with_documents(vec![
                Document::new("repeated"),
                Document::new("repeated"),
                Document::new("unique"),
            ]),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(contents(&first), vec!["repeated", "unique"]);

    let second = pipeline
        .run(
            IngestionRunArgs::new()
                .with_documents(vec![Document::new("unique"), Document::new("fresh")]),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(contents(&second), vec!["fresh"]);
    assert_eq!(store.count_documents().await.unwrap(), 3);
}

#[tokio::test]
async fn test_dedup_duplicates_only_tracks_edits_under_same_id() {
    let store = docstore();
    let pipeline = IngestionPipeline::builder()
        .with_docstore(store.clone())
        .with_docstore_strategy(DocstoreStrategy::DuplicatesOnly)
        .disable_cache()
        .build()
        .unwrap();
    let id = Uuid::new_v4();
    let options = TransformOptions::default();
    let run = |content: &'static str| {
        pipeline.run(
            IngestionRunArgs::new().with_documents(vec![Document::with_id(id, content)]),
            &options,
        )
    };

    assert_eq!(contents(&run("v1").await.unwrap()), vec!["v1"]);
    let edited = run("v2").await.unwrap();
    assert_eq!(contents(&edited), vec!["v2"]);
    assert_eq!(
        store.get_document_hash(&id.to_string()).await.unwrap(),
        Some(edited[0].hash())
    );

    assert!(run("v2").await.unwrap().is_empty());
    assert_eq!(store.count_documents().await.unwrap(), 1);
}

#[tokio::test]
async fn test_dedup_duplicates_only_same_id_twice_in_one_batch() {
    let store = docstore();
    let pipeline = IngestionPipeline::builder()
        .with_docstore(store.clone())
        .with_docstore_strategy(DocstoreStrategy::DuplicatesOnly)
        .disable_cache()
        .build()
        .unwrap();
    let id = Uuid::new_v4();

    let out = pipeline
        .run(
            IngestionRunArgs::new().with_documents(vec![
                Document::with_id(id, "a"),
                Document::with_id(id, "b"),
            ]),
            &TransformOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(contents(&out), vec!["a", "b"]);
    assert_eq!(
        store.get_document_hash(&id.to_string()).await.unwrap(),
        Some(out[1].hash())
    );
}

#[tokio::test]
async fn test_dedup_upserts() {
    let store = docstore();
    let vectors = Arc::new(InMemoryVectorStore::unbounded());
    let embedder = Arc::new(MockEmbedder::new());
    let pipeline = IngestionPipeline::builder()
        .with_transformation(embedder.clone())
        .with_docstore(store.clone())
        .with_vector_store(vectors.clone())
        .disable_cache()
        .build()
        .unwrap();
    assert_eq!(pipeline.docstore_strategy(), DocstoreStrategy::Upserts);

    let (a_id, b_id) = (Uuid::new_v4(), Uuid::new_v4());
    let options = TransformOptions::default();
    let run = |docs: Vec<Document>| {
        pipeline.run(IngestionRunArgs::new().with_documents(docs), &options)
    };

    let first = run(vec![
        Document::with_id(a_id, "alpha"),
        Document::with_id(b_id, "beta"),
    ])
    .await
    .unwrap();
    assert_eq!(first.len(), 2);

    let second = run(vec![
        Document::with_id(a_id, "alpha"),
        Document::with_id(b_id, "beta, revised"),
    ])
    .await
    .unwrap();
    assert_eq!(contents(&second), vec!["beta, revised"]);

    let tracked = store.get_document_hash(&b_id.to_string()).await.unwrap();
    assert_eq!(tracked, Some(second[0].hash()));

    assert_eq!(vectors.count().await.unwrap(), 2);
    assert_eq!(
        vectors.get(&b_id).await.map(|n| n.content),
        Some("beta, revised".to_string())
    );
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test]
async fn test_dedup_upserts_and_delete() {
    let store = docstore();
    let vectors = Arc::new(InMemoryVectorStore::unbounded());
    let pipeline = IngestionPipeline::builder()
        .with_transformation(Arc::new(MockEmbedder::new()))
        .with_docstore(store.clone())
        .with_vector_store(vectors.clone())
        .with_docstore_strategy(DocstoreStrategy::UpsertsAndDelete)
        .build()
        .unwrap();

    let (a_id, b_id) = (Uuid::new_v4(), Uuid::new_v4());
    pipeline
        .run(
            IngestionRunArgs::new().with_documents(vec![
                Document::with_id(a_id, "alpha"),
                Document::with_id(b_id, "beta"),
            ]),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(vectors.count().await.unwrap(), 2);

    let out = pipeline
        .run(
            IngestionRunArgs::new().with_documents(vec![Document::with_id(a_id, "alpha")]),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert!(out.is_empty());

    let tracked = store.get_all_ref_doc_info().await.unwrap();
    assert!(tracked.contains_key(&a_id.to_string()));
    assert!(!tracked.contains_key(&b_id.to_string()));
    assert_eq!(store.get_document_hash(&b_id.to_string()).await.unwrap(), None);

    assert_eq!(vectors.count().await.unwrap(), 1);
    assert!(vectors.get(&b_id).await.is_none());
}

#[tokio::test]
async fn test_dedup_strategy_override_per_run() {
    let store = docstore();
    let pipeline = IngestionPipeline::builder()
        .with_docstore(store.clone())
        .build()
        .unwrap();
    let doc = Document::new("kept twice");

    let run = || async {
        pipeline
            .run(
                IngestionRunArgs::new()
                    .with_documents(vec![doc.clone()])
                    .with_docstore_strategy(Arc::new(DedupStrategy::NoOp)),
                &TransformOptions::default(),
            )
            .await
            .unwrap()
    };

    assert_eq!(run().await.len(), 1);
    assert_eq!(run().await.len(), 1);
    assert!(store.get_all_ref_doc_info().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persist_and_load() {
    let dir = TempDir::new().unwrap();
    let store = docstore();
    let pipeline = IngestionPipeline::builder()
        .with_transformation(Arc::new(MockEmbedder::new()))
        .with_docstore(store.clone())
        .build()
        .unwrap();
    let input = text_nodes(&["persist me"]);

    pipeline
        .run(
            IngestionRunArgs::new().with_nodes(input.clone()),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    pipeline.persist(dir.path(), None, None).await.unwrap();
    assert!(dir.path().join(DEFAULT_CACHE_NAME).exists());
    assert!(dir.path().join(DEFAULT_DOCSTORE_NAME).exists());

    let restored_store = docstore();
    let embedder = Arc::new(MockEmbedder::new());
    let restored = IngestionPipeline::builder()
        .with_transformation(embedder.clone())
        .with_docstore(restored_store.clone())
        .with_docstore_strategy(DocstoreStrategy::None)
        .build()
        .unwrap();
    restored.load(dir.path(), None, None).await.unwrap();

    assert_eq!(
        restored_store.get_all_ref_doc_info().await.unwrap(),
        store.get_all_ref_doc_info().await.unwrap()
    );

    let out = restored
        .run(
            IngestionRunArgs::new().with_nodes(input),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].has_embedding());
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_pipeline_from_json_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ingestion.json");
    tokio::fs::write(
        &path,
        r#"{ "name": "from-file", "num_workers": 2, "disable_cache": true }"#,
    )
    .await
    .unwrap();

    let config = IngestionConfig::from_json_file(&path).await.unwrap();
    let pipeline = IngestionPipeline::builder()
        .with_config(config)
        .with_transformations(vec![Arc::new(Append("-a")), Arc::new(Append("-b"))])
        .build()
        .unwrap();

    assert_eq!(pipeline.name(), "from-file");
    assert!(pipeline.cache.is_none());

    let out = pipeline
        .run(
            IngestionRunArgs::new().with_nodes(text_nodes(&["n"])),
            &TransformOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(contents(&out), vec!["n-a", "n-b"]);
}

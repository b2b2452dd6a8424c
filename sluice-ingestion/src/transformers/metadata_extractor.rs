//! Metadata extraction stage.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sluice_core::{
    traits::{TransformComponent, TransformOptions},
    Node, Result,
};
use tracing::debug;

static MARKDOWN_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+(.+)$").expect("valid header pattern"));
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s)]+").expect("valid url pattern"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email pattern")
});

/// What [`MetadataExtractor`] records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Record the first markdown header as `title`.
    pub extract_title: bool,
    /// Record `word_count`, `char_count` and `line_count`.
    pub extract_statistics: bool,
    /// Record `urls` and `emails` found in the content.
    pub extract_links: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            extract_title: true,
            extract_statistics: true,
            extract_links: false,
        }
    }
}

impl MetadataConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle title extraction.
    #[must_use]
    pub fn with_title_extraction(mut self, enabled: bool) -> Self {
        self.extract_title = enabled;
        self
    }

    /// Toggle content statistics.
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.extract_statistics = enabled;
        self
    }

    /// Toggle url and email extraction.
    #[must_use]
    pub fn with_links(mut self, enabled: bool) -> Self {
        self.extract_links = enabled;
        self
    }
}

/// Enriches nodes with metadata derived from their content.
///
/// ```rust
/// use sluice_ingestion::transformers::{MetadataConfig, MetadataExtractor};
/// use sluice_core::{traits::{TransformComponent, TransformOptions}, ChunkInfo, Node};
///
/// # tokio_test::block_on(async {
/// let extractor = MetadataExtractor::with_config(MetadataConfig::new().with_links(true));
/// let node = Node::new("# Intro\nSee https://example.com", uuid::Uuid::new_v4(), ChunkInfo::default());
///
/// let out = extractor.transform(vec![node], &TransformOptions::default()).await.unwrap();
/// assert_eq!(out[0].get_metadata("title"), Some(&serde_json::json!("Intro")));
/// assert_eq!(out[0].get_metadata("urls"), Some(&serde_json::json!(["https://example.com"])));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    config: MetadataConfig,
}

impl MetadataExtractor {
    /// Create an extractor with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with `config`.
    #[must_use]
    pub fn with_config(config: MetadataConfig) -> Self {
        Self { config }
    }

    /// Get the extractor configuration.
    #[must_use]
    pub fn metadata_config(&self) -> &MetadataConfig {
        &self.config
    }

    fn enrich(&self, mut node: Node) -> Node {
        let content = node.content.clone();

        if self.config.extract_title {
            if let Some(title) = MARKDOWN_HEADER
                .captures(&content)
                .and_then(|cap| cap.get(1))
                .map(|m| m.as_str().trim().to_string())
            {
                node.metadata.insert("title".to_string(), Value::String(title));
            }
        }

        if self.config.extract_statistics {
            node.metadata.insert(
                "word_count".to_string(),
                Value::from(content.split_whitespace().count()),
            );
            node.metadata
                .insert("char_count".to_string(), Value::from(content.chars().count()));
            node.metadata
                .insert("line_count".to_string(), Value::from(content.lines().count()));
        }

        if self.config.extract_links {
            let urls: Vec<Value> = URL
                .find_iter(&content)
                .map(|m| Value::String(m.as_str().to_string()))
                .collect();
            if !urls.is_empty() {
                node.metadata.insert("urls".to_string(), Value::Array(urls));
            }

            let emails: Vec<Value> = EMAIL
                .find_iter(&content)
                .map(|m| Value::String(m.as_str().to_string()))
                .collect();
            if !emails.is_empty() {
                node.metadata.insert("emails".to_string(), Value::Array(emails));
            }
        }

        node
    }
}

#[async_trait]
impl TransformComponent for MetadataExtractor {
    async fn transform(&self, nodes: Vec<Node>, _options: &TransformOptions) -> Result<Vec<Node>> {
        debug!("Extracting metadata for {} nodes", nodes.len());
        Ok(nodes.into_iter().map(|node| self.enrich(node)).collect())
    }

    fn name(&self) -> &'static str {
        "MetadataExtractor"
    }

    fn config(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }
}

//! Ingestion pipeline configuration.

use serde::{Deserialize, Serialize};
use sluice_core::{Result, SluiceError};
use std::{path::Path, time::Duration};

use crate::strategies::DocstoreStrategy;

/// Configuration for the ingestion pipeline.
///
/// Every field has a default, so a configuration file only needs to list
/// what it changes:
///
/// ```rust
/// use sluice_ingestion::pipeline::IngestionConfig;
/// use sluice_ingestion::strategies::DocstoreStrategy;
///
/// let config = IngestionConfig::from_json_str(
///     r#"{ "num_workers": 4, "docstore_strategy": "duplicates_only" }"#,
/// )
/// .unwrap();
/// assert_eq!(config.num_workers, 4);
/// assert_eq!(config.docstore_strategy, DocstoreStrategy::DuplicatesOnly);
/// assert!(!config.disable_cache);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Name of the pipeline, used in log lines.
    pub name: String,
    /// Whether to log progress during processing.
    pub show_progress: bool,
    /// Number of stages allowed to run at once. Above 1, stages run in
    /// parallel over the same input.
    pub num_workers: usize,
    /// Document deduplication strategy.
    pub docstore_strategy: DocstoreStrategy,
    /// Whether to disable caching.
    pub disable_cache: bool,
    /// Cache collection name for transformations.
    pub cache_collection: Option<String>,
    /// Expire cache entries after this many seconds.
    pub cache_ttl_secs: Option<u64>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            name: "default_pipeline".to_string(),
            show_progress: false,
            num_workers: 1,
            docstore_strategy: DocstoreStrategy::Upserts,
            disable_cache: false,
            cache_collection: None,
            cache_ttl_secs: None,
        }
    }
}

impl IngestionConfig {
    /// Load configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the JSON is invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            SluiceError::configuration(format!("Failed to parse JSON configuration: {e}"))
        })
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| {
                SluiceError::configuration(format!(
                    "Failed to read configuration file {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;

        Self::from_json_str(&content)
    }

    /// Serialize the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(SluiceError::configuration(
                "num_workers must be at least 1",
            ));
        }
        if self.cache_ttl_secs == Some(0) {
            return Err(SluiceError::configuration(
                "cache_ttl_secs must be greater than 0",
            ));
        }
        if matches!(&self.cache_collection, Some(name) if name.trim().is_empty()) {
            return Err(SluiceError::configuration(
                "cache_collection must not be empty",
            ));
        }
        Ok(())
    }

    /// Cache entry TTL, if configured.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = IngestionConfig::default();
        assert_eq!(config.num_workers, 1);
        assert_eq!(config.docstore_strategy, DocstoreStrategy::Upserts);
        assert!(!config.disable_cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = IngestionConfig {
            name: "docs".to_string(),
            num_workers: 3,
            cache_ttl_secs: Some(60),
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(IngestionConfig::from_json_str(&json).unwrap(), config);
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_validation_errors() {
        let zero_workers = IngestionConfig {
            num_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_workers.validate(),
            Err(SluiceError::Configuration { .. })
        ));

        let blank_collection = IngestionConfig {
            cache_collection: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank_collection.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = IngestionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SluiceError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingestion.json");
        tokio::fs::write(&path, r#"{ "show_progress": true }"#)
            .await
            .unwrap();

        let config = IngestionConfig::from_json_file(&path).await.unwrap();
        assert!(config.show_progress);
        assert_eq!(config.num_workers, 1);

        assert!(IngestionConfig::from_json_file(dir.path().join("missing.json"))
            .await
            .is_err());
    }
}

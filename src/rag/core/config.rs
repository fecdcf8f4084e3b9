//! Configuration for indexing, retrieval and generation.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::rag::core::errors::{RagError, RagResult};

/// Top-level configuration for the retrieval pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Embedding model settings.
    pub embedding: EmbeddingConfig,
    /// Completion model settings.
    pub llm: LlmConfig,
}

impl RagConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> RagResult<()> {
        if self.retrieval.top_k == 0 {
            return Err(RagError::InvalidConfig(
                "retrieval.top_k must be > 0".to_string(),
            ));
        }

        if self.embedding.ndims == 0 {
            return Err(RagError::InvalidConfig(
                "embedding.ndims must be > 0".to_string(),
            ));
        }

        if let RefreshPolicy::MaxAge { seconds: 0 } = self.storage.refresh {
            return Err(RagError::InvalidConfig(
                "storage.refresh.seconds must be > 0".to_string(),
            ));
        }

        if self.storage.index_dir.as_os_str().is_empty() {
            return Err(RagError::InvalidConfig(
                "storage.index_dir must not be empty".to_string(),
            ));
        }

        if let Some(base_url) = &self.embedding.base_url {
            Url::parse(base_url)?;
        }

        if let Some(base_url) = &self.llm.base_url {
            Url::parse(base_url)?;
        }

        Ok(())
    }
}

/// When an existing index is rebuilt from a newer staging file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RefreshPolicy {
    /// Build once, then only reopen.
    #[default]
    Never,
    /// Rebuild whenever staged records are waiting.
    WhenStaged,
    /// Rebuild when the index is older than the given age and records are waiting.
    MaxAge {
        /// Maximum index age in seconds.
        seconds: u64,
    },
}

impl RefreshPolicy {
    /// Maximum age before a rebuild, if the policy has one.
    #[must_use]
    pub const fn max_age(&self) -> Option<Duration> {
        match self {
            Self::MaxAge { seconds } => Some(Duration::from_secs(*seconds)),
            Self::Never | Self::WhenStaged => None,
        }
    }
}

/// Filesystem locations shared by the scraper and the indexer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of the persisted index.
    pub index_dir: PathBuf,
    /// Staging CSV written by scrape runs.
    pub staging_path: PathBuf,
    /// Freshness rule for an existing index.
    pub refresh: RefreshPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("trend_index"),
            staging_path: PathBuf::from("output.csv"),
            refresh: RefreshPolicy::Never,
        }
    }
}

/// Retrieval settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of documents to retrieve per question.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

/// Embedding model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama embedding model name.
    pub model: String,
    /// Embedding vector dimensions.
    pub ndims: usize,
    /// Optional custom base URL.
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text:v1.5".to_string(),
            ndims: 768,
            base_url: None,
        }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama completion model name.
    pub model: String,
    /// Temperature for generation.
    pub temperature: f64,
    /// Nucleus sampling threshold.
    pub top_p: f64,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Minimum token probability relative to the best token.
    pub min_p: f64,
    /// Optional max tokens.
    pub max_tokens: Option<u64>,
    /// Optional custom base URL.
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:4b".to_string(),
            temperature: 0.6,
            top_p: 0.95,
            top_k: 20,
            min_p: 0.0,
            max_tokens: None,
            base_url: None,
        }
    }
}

//! Error types for the indexing and answering pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::scraping::ScrapingError;

/// Pipeline error type.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Scrape run or staging file failure.
    #[error("scraping error: {0}")]
    Staging(#[from] ScrapingError),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// The persisted index exists but is unreadable.
    #[error("corrupt index at {path}: {reason}")]
    CorruptIndex {
        /// Index directory.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
    /// Another process holds the build lock.
    #[error("index build already in progress (lock file {0})")]
    BuildInProgress(PathBuf),
    /// No index exists and nothing is staged to build one.
    #[error("no index available; run a scrape first")]
    IndexUnavailable,
    /// The embedding service returned a different number of vectors than requested.
    #[error("embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingMismatch {
        /// Texts sent.
        expected: usize,
        /// Vectors received.
        actual: usize,
    },
    /// A vector does not have the expected number of dimensions.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions of the index or the configured model.
        expected: usize,
        /// Dimensions of the offending vector.
        actual: usize,
    },
    /// The index was built with a different embedding model than the configured one.
    #[error("index built with embedding model {stored}, configured model is {configured}; rebuild it with `trendrag refresh`")]
    EmbeddingModelChanged {
        /// Model recorded in the index.
        stored: String,
        /// Model of the current embedder.
        configured: String,
    },
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] rig::embeddings::EmbeddingError),
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
    /// Built-in pattern failed to compile.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for pipeline operations.
pub type RagResult<T> = Result<T, RagError>;

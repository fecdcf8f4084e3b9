//! Core pipeline types: configuration, errors and documents.

pub mod config;
pub mod document;
pub mod errors;
pub mod ollama;

pub use config::{
    EmbeddingConfig, LlmConfig, RagConfig, RefreshPolicy, RetrievalConfig, StorageConfig,
};
pub use document::{DocumentMetadata, IndexDocument, ScoredDocument, documents_from_entries};
pub use errors::{RagError, RagResult};
pub use ollama::{OllamaClient, ollama_client};

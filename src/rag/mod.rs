//! Retrieval-augmented answering over scraped trends.
//!
//! This module is organized into:
//! - `core`: Configuration, errors, document types and the Ollama client
//! - `embedding`: Embedding model abstraction and Ollama implementation
//! - `generation`: Completion model abstraction and Ollama implementation
//! - `storage`: Persisted SQLite index and its build lock
//! - `indexer`: Build-once index construction from the staging file
//! - `retrieval`: Top-K similarity search
//! - `prompt`: Prompt template and answer formatting
//! - `answer`: Answer generation and the `ask` pipeline

pub mod answer;
pub mod core;
pub mod embedding;
pub mod generation;
pub mod indexer;
pub mod prompt;
pub mod retrieval;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use answer::{Answerer, TrendAssistant};
pub use self::core::{
    DocumentMetadata, EmbeddingConfig, IndexDocument, LlmConfig, RagConfig, RagError, RagResult,
    RefreshPolicy, RetrievalConfig, ScoredDocument, StorageConfig,
};
pub use embedding::{Embedder, OllamaEmbedder};
pub use generation::{Generator, OllamaGenerator};
pub use indexer::Indexer;
pub use retrieval::Retriever;
pub use storage::{IndexInfo, TrendIndex};

//! Embedding service clients.

pub mod embedder;

pub use embedder::{EmbedFuture, Embedder, OllamaEmbedder};

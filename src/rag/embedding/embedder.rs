//! Vectorization of listing documents and questions.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client as ReqwestClient;
use rig::client::EmbeddingsClient;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig::providers::ollama;

use crate::rag::core::config::EmbeddingConfig;
use crate::rag::core::errors::{RagError, RagResult};
use crate::rag::core::ollama::ollama_client;

/// Boxed future type for embedder operations.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns documents and questions into comparable vectors.
///
/// Both methods must use the same model, whose name is recorded in the index.
pub trait Embedder: Send + Sync {
    /// Vectorize a whole staging batch in a single request.
    ///
    /// # Errors
    /// Returns an error if the embedding request fails.
    fn embed_documents(&self, texts: Vec<String>) -> EmbedFuture<'_, RagResult<Vec<Embedding>>>;
    /// Vectorize one question.
    ///
    /// # Errors
    /// Returns an error if the embedding request fails.
    fn embed_query(&self, query: &str) -> EmbedFuture<'_, RagResult<Vec<f64>>>;
    /// Model recorded alongside the vectors it produced.
    fn model_name(&self) -> &str;
}

/// Ollama embedding model (`nomic-embed-text:v1.5` by default) reached through Rig.
#[derive(Clone)]
pub struct OllamaEmbedder {
    model: ollama::EmbeddingModel<ReqwestClient>,
    name: String,
    ndims: usize,
}

impl OllamaEmbedder {
    /// Build an embedder for `config.model`.
    ///
    /// # Errors
    /// Returns an error if the client cannot be built.
    pub fn new(config: &EmbeddingConfig) -> RagResult<Self> {
        let client = ollama_client(config.base_url.as_deref())?;
        Ok(Self {
            model: client.embedding_model_with_ndims(config.model.clone(), config.ndims),
            name: config.model.clone(),
            ndims: config.ndims,
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_documents(&self, texts: Vec<String>) -> EmbedFuture<'_, RagResult<Vec<Embedding>>> {
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let embeddings = self.model.embed_texts(texts).await?;
            for embedding in &embeddings {
                check_dims(&embedding.vec, self.ndims)?;
            }
            Ok(embeddings)
        })
    }

    fn embed_query(&self, query: &str) -> EmbedFuture<'_, RagResult<Vec<f64>>> {
        let query = query.to_string();
        Box::pin(async move {
            let embedding = self.model.embed_text(&query).await?;
            check_dims(&embedding.vec, self.ndims)?;
            Ok(embedding.vec)
        })
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Reject vectors whose length differs from the configured dimensionality.
fn check_dims(vector: &[f64], ndims: usize) -> RagResult<()> {
    if vector.len() == ndims {
        Ok(())
    } else {
        Err(RagError::DimensionMismatch {
            expected: ndims,
            actual: vector.len(),
        })
    }
}

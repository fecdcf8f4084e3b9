//! Question answering over the trend index.

use std::sync::Arc;

use crate::rag::answer::answerer::Answerer;
use crate::rag::core::config::RagConfig;
use crate::rag::core::errors::{RagError, RagResult};
use crate::rag::embedding::{Embedder, OllamaEmbedder};
use crate::rag::generation::{Generator, OllamaGenerator};
use crate::rag::indexer::Indexer;
use crate::rag::retrieval::Retriever;

/// Entry point for answering questions about current trends.
pub struct TrendAssistant {
    indexer: Indexer,
    embedder: Arc<dyn Embedder>,
    answerer: Answerer,
    top_k: usize,
}

impl TrendAssistant {
    /// Assemble an assistant from explicit service handles.
    ///
    /// # Errors
    /// Returns an error if the answerer cannot be built.
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> RagResult<Self> {
        Ok(Self {
            indexer: Indexer::new(config.storage.clone(), Arc::clone(&embedder)),
            embedder,
            answerer: Answerer::new(generator)?,
            top_k: config.retrieval.top_k,
        })
    }

    /// Assemble an assistant backed by Ollama.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or a client cannot be built.
    pub fn from_config(config: &RagConfig) -> RagResult<Self> {
        config.validate()?;
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(&config.embedding)?);
        let generator: Arc<dyn Generator> = Arc::new(OllamaGenerator::new(&config.llm)?);
        Self::new(config, embedder, generator)
    }

    /// Answer `question` from the most similar indexed trends.
    ///
    /// # Errors
    /// Returns [`RagError::IndexUnavailable`] when there is no index and nothing
    /// staged to build one, or any indexing, retrieval or generation error.
    pub async fn ask(&self, question: &str) -> RagResult<String> {
        let index = self
            .indexer
            .ensure_index()
            .await?
            .ok_or(RagError::IndexUnavailable)?;
        let retriever = Retriever::new(index, Arc::clone(&self.embedder), self.top_k);
        let documents = retriever.retrieve(question).await?;
        tracing::info!("Answering with {} retrieved documents", documents.len());
        self.answerer.answer(question, &documents).await
    }
}

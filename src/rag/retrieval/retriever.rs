//! Top-K similarity search over the persisted index.

use std::sync::Arc;

use crate::rag::core::document::{IndexDocument, ScoredDocument};
use crate::rag::core::errors::RagResult;
use crate::rag::embedding::Embedder;
use crate::rag::storage::TrendIndex;

/// Query interface over an opened index.
pub struct Retriever {
    index: TrendIndex,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    /// Wrap an opened index.
    #[must_use]
    pub fn new(index: TrendIndex, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    /// Number of documents returned per query.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Return up to `top_k` documents for `query` with their scores, best first.
    ///
    /// # Errors
    /// Returns an error if the query cannot be embedded or the index cannot be read.
    pub async fn retrieve_scored(&self, query: &str) -> RagResult<Vec<ScoredDocument>> {
        let query_vector = self.embedder.embed_query(query).await?;
        let hits = self.index.search(&query_vector, self.top_k).await?;
        tracing::debug!("Retrieved {} documents for query", hits.len());
        Ok(hits)
    }

    /// Return up to `top_k` documents for `query`, best first.
    ///
    /// # Errors
    /// Returns an error if the query cannot be embedded or the index cannot be read.
    pub async fn retrieve(&self, query: &str) -> RagResult<Vec<IndexDocument>> {
        Ok(self
            .retrieve_scored(query)
            .await?
            .into_iter()
            .map(|hit| hit.document)
            .collect())
    }
}

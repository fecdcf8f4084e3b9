//! Single-shot answer generation over retrieved trends.

use std::sync::Arc;

use crate::rag::core::document::IndexDocument;
use crate::rag::core::errors::RagResult;
use crate::rag::generation::Generator;
use crate::rag::prompt::{ResponseFormatter, build_context, build_prompt};

/// Turns a question and its retrieved documents into a display-ready answer.
pub struct Answerer {
    generator: Arc<dyn Generator>,
    formatter: ResponseFormatter,
}

impl Answerer {
    /// Create an answerer backed by `generator`.
    ///
    /// # Errors
    /// Returns an error if the response formatter cannot be built.
    pub fn new(generator: Arc<dyn Generator>) -> RagResult<Self> {
        Ok(Self {
            generator,
            formatter: ResponseFormatter::new()?,
        })
    }

    /// Generate an answer for `question` grounded in `documents`.
    ///
    /// The generation service is called exactly once.
    ///
    /// # Errors
    /// Returns an error if the completion request fails.
    pub async fn answer(&self, question: &str, documents: &[IndexDocument]) -> RagResult<String> {
        let context = build_context(documents);
        let prompt = build_prompt(&context, question);
        tracing::debug!(
            "Generating answer with {} context documents ({} chars)",
            documents.len(),
            prompt.len()
        );
        let raw = self.generator.generate(&prompt).await?;
        Ok(self.formatter.format(&raw))
    }
}

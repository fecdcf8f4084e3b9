//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::rag::{RagConfig, RagResult, TrendAssistant};

/// Shared application state.
pub struct AppState {
    /// Question-answering pipeline.
    pub assistant: TrendAssistant,
}

impl AppState {
    /// Wrap an assistant for sharing across handlers.
    #[must_use]
    pub fn new(assistant: TrendAssistant) -> Arc<Self> {
        Arc::new(Self { assistant })
    }

    /// Create state backed by Ollama.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or a client cannot be built.
    pub fn from_config(config: &RagConfig) -> RagResult<Arc<Self>> {
        Ok(Self::new(TrendAssistant::from_config(config)?))
    }
}

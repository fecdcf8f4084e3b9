//! Completion model wrapper for Rig + Ollama.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::ollama;

use crate::rag::core::config::LlmConfig;
use crate::rag::core::errors::RagResult;
use crate::rag::core::ollama::ollama_client;

/// Boxed future type for generation.
pub type GenerateFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over text generation services.
pub trait Generator: Send + Sync {
    /// Complete a single prompt, without streaming.
    ///
    /// # Errors
    /// Returns an error if the completion request fails.
    fn generate(&self, prompt: &str) -> GenerateFuture<'_, RagResult<String>>;
}

type OllamaCompletionModel = ollama::CompletionModel<ReqwestClient>;

/// Ollama text generator using Rig provider.
#[derive(Clone)]
pub struct OllamaGenerator {
    model: OllamaCompletionModel,
    config: LlmConfig,
}

impl OllamaGenerator {
    /// Create a new Ollama generator from config.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(config: &LlmConfig) -> RagResult<Self> {
        let client = ollama_client(config.base_url.as_deref())?;
        let model = client.completion_model(config.model.clone());
        Ok(Self {
            model,
            config: config.clone(),
        })
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> GenerateFuture<'_, RagResult<String>> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            let request = self
                .model
                .completion_request(prompt)
                .temperature(self.config.temperature)
                .max_tokens_opt(self.config.max_tokens)
                // Ollama reads sampling settings from `options`; temperature is
                // repeated so a shallow merge keeps it.
                .additional_params(serde_json::json!({
                    "options": {
                        "temperature": self.config.temperature,
                        "top_p": self.config.top_p,
                        "top_k": self.config.top_k,
                        "min_p": self.config.min_p,
                    }
                }))
                .build();

            let response = self.model.completion(request).await?;
            Ok(extract_text(&response.choice))
        })
    }
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}

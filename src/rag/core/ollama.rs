//! Shared Ollama client construction.

use reqwest::Client as ReqwestClient;
use rig::client::Nothing;
use rig::providers::ollama;

use crate::rag::core::errors::RagResult;

/// Ollama client over reqwest.
pub type OllamaClient = ollama::Client<ReqwestClient>;

/// Build a client for the local Ollama daemon, or for `base_url` when set.
///
/// # Errors
/// Returns an error if the client cannot be built.
pub fn ollama_client(base_url: Option<&str>) -> RagResult<OllamaClient> {
    let builder = OllamaClient::builder().api_key(Nothing);
    let builder = match base_url {
        Some(url) => builder.base_url(url),
        None => builder,
    };
    Ok(builder.build()?)
}

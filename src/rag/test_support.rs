//! In-process stand-ins for the embedding and generation services.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rig::embeddings::Embedding;

use crate::rag::core::errors::RagResult;
use crate::rag::embedding::{EmbedFuture, Embedder};
use crate::rag::generation::{GenerateFuture, Generator};
use crate::scraping::types::TrendEntry;

/// Embeds text as a letter-frequency vector and counts batch calls.
#[derive(Default)]
pub struct FakeEmbedder {
    pub batch_calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

fn letter_frequencies(text: &str) -> Vec<f64> {
    let mut vec = vec![0.0; 27];
    for c in text.to_lowercase().chars() {
        match c {
            'a'..='z' => vec[(c as usize) - ('a' as usize)] += 1.0,
            '0'..='9' => vec[26] += 1.0,
            _ => {}
        }
    }
    vec
}

impl Embedder for FakeEmbedder {
    fn embed_documents(&self, texts: Vec<String>) -> EmbedFuture<'_, RagResult<Vec<Embedding>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            Ok(texts
                .into_iter()
                .map(|text| Embedding {
                    vec: letter_frequencies(&text),
                    document: text,
                })
                .collect())
        })
    }

    fn embed_query(&self, query: &str) -> EmbedFuture<'_, RagResult<Vec<f64>>> {
        let vec = letter_frequencies(query);
        Box::pin(async move { Ok(vec) })
    }

    fn model_name(&self) -> &str {
        "fake-embed"
    }
}

/// Records every prompt and answers with a fixed reply, or echoes the prompt.
#[derive(Default)]
pub struct FakeGenerator {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &str) -> GenerateFuture<'_, RagResult<String>> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let out = self.reply.clone().unwrap_or_else(|| prompt.to_string());
        Box::pin(async move { Ok(out) })
    }
}

pub fn entry(node_id: &str, node_name: &str, rank: &str, title: &str, link: &str) -> TrendEntry {
    TrendEntry {
        node_id: node_id.to_string(),
        node_name: node_name.to_string(),
        rank: rank.to_string(),
        title: title.to_string(),
        link: link.to_string(),
        scrape_time: "2024-01-01T00:00:00".to_string(),
        extra: String::new(),
        page_url: "http://src".to_string(),
    }
}

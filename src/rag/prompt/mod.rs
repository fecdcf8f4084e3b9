//! Prompt construction and answer formatting.

pub mod prompt_builder;
pub mod response_format;

pub use prompt_builder::{RAG_PROMPT_TEMPLATE, build_context, build_prompt};
pub use response_format::ResponseFormatter;

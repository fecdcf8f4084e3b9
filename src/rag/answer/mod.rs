//! Answer generation and the question-answering pipeline.

pub mod answerer;
pub mod pipeline;

pub use answerer::Answerer;
pub use pipeline::TrendAssistant;

//! Text generation service clients.

pub mod generator;

pub use generator::{GenerateFuture, Generator, OllamaGenerator};

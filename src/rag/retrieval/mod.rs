//! Retrieval over the persisted index.

pub mod retriever;

pub use retriever::Retriever;

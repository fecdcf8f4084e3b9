//! Documents stored in the persisted index.

use serde::{Deserialize, Serialize};

use crate::scraping::types::TrendEntry;

/// Metadata kept alongside an indexed document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source card identifier.
    pub node_id: String,
    /// Target URL of the listing item.
    pub link: String,
    /// Auxiliary annotation.
    pub extra: String,
}

/// Embeddable form of a [`TrendEntry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// `"{rank} {title} {node_name} {scrape_time}"`.
    pub content: String,
    /// Fields kept for display but not embedded.
    pub metadata: DocumentMetadata,
}

impl From<&TrendEntry> for IndexDocument {
    fn from(entry: &TrendEntry) -> Self {
        Self {
            content: format!(
                "{} {} {} {}",
                entry.rank, entry.title, entry.node_name, entry.scrape_time
            ),
            metadata: DocumentMetadata {
                node_id: entry.node_id.clone(),
                link: entry.link.clone(),
                extra: entry.extra.clone(),
            },
        }
    }
}

/// Convert staged entries into index documents, preserving order.
#[must_use]
pub fn documents_from_entries(entries: &[TrendEntry]) -> Vec<IndexDocument> {
    entries.iter().map(IndexDocument::from).collect()
}

/// A document returned by a similarity search.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredDocument {
    /// Cosine similarity to the query.
    pub score: f64,
    /// Retrieved document.
    pub document: IndexDocument,
}

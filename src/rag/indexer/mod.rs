//! Construction of the persisted index from the staging file.
//!
//! An index is built at most once: when its directory exists it is opened as
//! is, unless the configured [`RefreshPolicy`] asks for a rebuild. Builds are
//! serialized by a lock file, written to a scratch directory and renamed into
//! place. The staging file is deleted only after the new index is in place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::rag::core::config::{RefreshPolicy, StorageConfig};
use crate::rag::core::document::documents_from_entries;
use crate::rag::core::errors::{RagError, RagResult};
use crate::rag::embedding::Embedder;
use crate::rag::storage::{BuildLock, IndexInfo, TrendIndex};
use crate::scraping::staging;

/// Builds and opens the persisted index.
pub struct Indexer {
    storage: StorageConfig,
    embedder: Arc<dyn Embedder>,
}

impl Indexer {
    /// Create an indexer over the given locations.
    #[must_use]
    pub fn new(storage: StorageConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self { storage, embedder }
    }

    /// Locations this indexer reads and writes.
    #[must_use]
    pub const fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Open the index, building it from the staging file when none exists.
    ///
    /// Returns `Ok(None)` when there is no index and nothing staged.
    ///
    /// # Errors
    /// Returns an error if the staging file cannot be read, embedding fails,
    /// the index cannot be written, or another build holds the lock.
    pub async fn ensure_index(&self) -> RagResult<Option<TrendIndex>> {
        let dir = &self.storage.index_dir;

        if TrendIndex::exists(dir) {
            let index = TrendIndex::open(dir).await?;
            let info = index.info().await?;
            if !self.should_refresh(&info)? {
                tracing::info!("Loading existing index from {}", dir.display());
                return Ok(Some(index));
            }
            tracing::info!("Index at {} is due for a refresh", dir.display());
            index.close().await?;
            return self.build(true).await;
        }

        tracing::info!("No existing index found, creating new one");
        self.build(false).await
    }

    /// Rebuild the index from the staging file.
    ///
    /// When nothing is staged the current index, if any, is kept.
    ///
    /// # Errors
    /// Same as [`Indexer::ensure_index`].
    pub async fn refresh(&self) -> RagResult<Option<TrendIndex>> {
        self.build(true).await
    }

    fn should_refresh(&self, info: &IndexInfo) -> RagResult<bool> {
        let staged = || staging::has_staged_records(&self.storage.staging_path);

        // Vectors from another model cannot be compared with this embedder's queries.
        let configured = self.embedder.model_name();
        if info.embedding_model != configured {
            if staged() {
                tracing::warn!(
                    "Index was built with {}, rebuilding with {configured}",
                    info.embedding_model
                );
                return Ok(true);
            }
            return Err(RagError::EmbeddingModelChanged {
                stored: info.embedding_model.clone(),
                configured: configured.to_string(),
            });
        }

        Ok(match self.storage.refresh {
            RefreshPolicy::Never => false,
            RefreshPolicy::WhenStaged => staged(),
            RefreshPolicy::MaxAge { .. } => {
                staged()
                    && self
                        .storage
                        .refresh
                        .max_age()
                        .is_some_and(|max| info.age() > max)
            }
        })
    }

    async fn build(&self, replace: bool) -> RagResult<Option<TrendIndex>> {
        let dir = &self.storage.index_dir;
        let _lock = BuildLock::acquire(&sibling(dir, ".lock"))?;

        // Another builder may have finished while we waited for the lock.
        if !replace && TrendIndex::exists(dir) {
            return TrendIndex::open(dir).await.map(Some);
        }

        let staging_path = &self.storage.staging_path;
        tracing::info!("Loading documents from {}", staging_path.display());
        let entries = match staging::read_staging(staging_path)? {
            Some(entries) if !entries.is_empty() => entries,
            Some(_) | None => {
                tracing::warn!(
                    "No documents loaded from {}, check the last scrape run",
                    staging_path.display()
                );
                return if TrendIndex::exists(dir) {
                    TrendIndex::open(dir).await.map(Some)
                } else {
                    Ok(None)
                };
            }
        };

        let documents = documents_from_entries(&entries);
        tracing::info!("Embedding {} documents", documents.len());
        let texts = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_documents(texts).await?;
        if embeddings.len() != documents.len() {
            return Err(RagError::EmbeddingMismatch {
                expected: documents.len(),
                actual: embeddings.len(),
            });
        }

        let scratch = sibling(dir, ".building");
        remove_dir_if_exists(&scratch).await?;
        let index =
            TrendIndex::create(&scratch, &documents, &embeddings, self.embedder.model_name())
                .await?;
        index.close().await?;
        swap_into_place(&scratch, dir).await?;
        tracing::info!("Index with {} documents written to {}", documents.len(), dir.display());

        tracing::info!("Deleting staging file {}", staging_path.display());
        staging::remove_staging(staging_path)?;

        TrendIndex::open(dir).await.map(Some)
    }
}

/// Path next to `dir` whose file name is `dir`'s name plus `suffix`.
fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = dir
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("trend_index"));
    name.push(suffix);
    dir.with_file_name(name)
}

async fn remove_dir_if_exists(dir: &Path) -> RagResult<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn swap_into_place(scratch: &Path, dir: &Path) -> RagResult<()> {
    if !dir.exists() {
        tokio::fs::rename(scratch, dir).await?;
        return Ok(());
    }

    let retired = sibling(dir, ".old");
    remove_dir_if_exists(&retired).await?;
    tokio::fs::rename(dir, &retired).await?;
    tokio::fs::rename(scratch, dir).await?;
    remove_dir_if_exists(&retired).await
}

//! Persisted vector index backed by `SQLite`.
//!
//! An index is a directory holding one database with the documents, their
//! metadata and their embeddings. Search is a brute-force cosine scan, which
//! is adequate for the few thousand rows a scrape run produces.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rig::embeddings::Embedding;
use tokio_rusqlite::Connection;

use crate::rag::core::document::{DocumentMetadata, IndexDocument, ScoredDocument};
use crate::rag::core::errors::{RagError, RagResult};

/// Database file inside the index directory.
pub const DB_FILE: &str = "index.sqlite3";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY,
    content TEXT NOT NULL,
    metadata_json TEXT NOT NULL,
    embedding BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Build information recorded in the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexInfo {
    /// When the index was written.
    pub built_at: DateTime<Utc>,
    /// Embedding model used for the stored vectors.
    pub embedding_model: String,
    /// Number of stored documents.
    pub document_count: usize,
}

impl IndexInfo {
    /// Time elapsed since the build.
    #[must_use]
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.built_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// An opened persisted index.
pub struct TrendIndex {
    conn: Connection,
    dir: PathBuf,
}

impl TrendIndex {
    /// Whether an index directory exists at `dir`.
    #[must_use]
    pub fn exists(dir: &Path) -> bool {
        dir.is_dir()
    }

    /// Open an existing index.
    ///
    /// # Errors
    /// Returns an error if the directory holds no index database or it cannot be opened.
    pub async fn open(dir: &Path) -> RagResult<Self> {
        let db = dir.join(DB_FILE);
        if !db.is_file() {
            return Err(RagError::CorruptIndex {
                path: dir.to_path_buf(),
                reason: format!("missing {DB_FILE}"),
            });
        }
        let conn = Connection::open(&db).await?;
        Ok(Self {
            conn,
            dir: dir.to_path_buf(),
        })
    }

    /// Write a new index to `dir` from documents and their embeddings.
    ///
    /// # Errors
    /// Returns an error if the counts differ or the database cannot be written.
    pub async fn create(
        dir: &Path,
        documents: &[IndexDocument],
        embeddings: &[Embedding],
        embedding_model: &str,
    ) -> RagResult<Self> {
        if documents.len() != embeddings.len() {
            return Err(RagError::EmbeddingMismatch {
                expected: documents.len(),
                actual: embeddings.len(),
            });
        }

        let mut rows = Vec::with_capacity(documents.len());
        for (doc, embedding) in documents.iter().zip(embeddings) {
            rows.push((
                doc.content.clone(),
                serde_json::to_string(&doc.metadata)?,
                encode_vector(&embedding.vec),
            ));
        }

        tokio::fs::create_dir_all(dir).await?;
        let conn = Connection::open(dir.join(DB_FILE)).await?;

        let meta = vec![
            ("built_at", Utc::now().to_rfc3339()),
            ("embedding_model", embedding_model.to_string()),
            ("document_count", rows.len().to_string()),
        ];

        conn.call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA)?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO documents (content, metadata_json, embedding) VALUES (?1, ?2, ?3)",
                )?;
                for (content, metadata_json, embedding) in &rows {
                    stmt.execute(rusqlite::params![content, metadata_json, embedding])?;
                }
            }
            {
                let mut stmt =
                    tx.prepare("INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)")?;
                for (key, value) in &meta {
                    stmt.execute(rusqlite::params![key, value])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            dir: dir.to_path_buf(),
        })
    }

    /// Directory of this index.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of stored documents.
    ///
    /// # Errors
    /// Returns an error if the database cannot be queried.
    pub async fn len(&self) -> RagResult<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Read the build information.
    ///
    /// # Errors
    /// Returns an error if the metadata is missing or malformed.
    pub async fn info(&self) -> RagResult<IndexInfo> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT key, value FROM index_meta")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(rows)
            })
            .await?;

        let lookup = |key: &str| {
            rows.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| self.corrupt(format!("missing {key}")))
        };

        let built_at = DateTime::parse_from_rfc3339(&lookup("built_at")?)
            .map_err(|e| self.corrupt(format!("bad built_at: {e}")))?
            .with_timezone(&Utc);
        let document_count = lookup("document_count")?
            .parse()
            .map_err(|e| self.corrupt(format!("bad document_count: {e}")))?;

        Ok(IndexInfo {
            built_at,
            embedding_model: lookup("embedding_model")?,
            document_count,
        })
    }

    /// Return the `top_k` documents most similar to `query`, best first.
    ///
    /// Equal scores keep insertion order. Rows sharing a link collapse to their
    /// best-scoring one, so a listing seen on several pages is returned once.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`] if a stored vector and `query`
    /// differ in length, or an error if the database cannot be read.
    pub async fn search(&self, query: &[f64], top_k: usize) -> RagResult<Vec<ScoredDocument>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT content, metadata_json, embedding FROM documents ORDER BY id")?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Vec<u8>>(2)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(rows)
            })
            .await?;

        let mut scored = Vec::with_capacity(rows.len());
        for (content, metadata_json, blob) in rows {
            let stored = decode_vector(&blob);
            if stored.len() != query.len() {
                return Err(RagError::DimensionMismatch {
                    expected: stored.len(),
                    actual: query.len(),
                });
            }
            let metadata: DocumentMetadata = serde_json::from_str(&metadata_json)?;
            scored.push(ScoredDocument {
                score: cosine_similarity(query, &stored),
                document: IndexDocument { content, metadata },
            });
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        let mut seen_links = HashSet::new();
        scored.retain(|hit| seen_links.insert(hit.document.metadata.link.clone()));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    /// Returns an error if the connection fails to close cleanly.
    pub async fn close(self) -> RagResult<()> {
        self.conn.close().await?;
        Ok(())
    }

    fn corrupt(&self, reason: String) -> RagError {
        RagError::CorruptIndex {
            path: self.dir.clone(),
            reason,
        }
    }
}

fn encode_vector(vector: &[f64]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect()
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f64::EPSILON { 0.0 } else { dot / denom }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str, link: &str) -> IndexDocument {
        IndexDocument {
            content: content.to_string(),
            metadata: DocumentMetadata {
                node_id: "node-1".to_string(),
                link: link.to_string(),
                extra: String::new(),
            },
        }
    }

    fn embedding(vec: Vec<f64>) -> Embedding {
        Embedding {
            document: String::new(),
            vec,
        }
    }

    #[test]
    fn test_vector_codec() {
        let v = vec![0.5, -1.25, 3.0];
        assert_eq!(decode_vector(&encode_vector(&v)), v);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_create_reopen_and_search() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("trend_index");
        let docs = vec![doc("a", "http://a"), doc("b", "http://b"), doc("c", "http://c")];
        let vectors = vec![
            embedding(vec![1.0, 0.0]),
            embedding(vec![0.0, 1.0]),
            embedding(vec![0.7, 0.7]),
        ];

        let index = TrendIndex::create(&dir, &docs, &vectors, "test-embed").await.unwrap();
        assert!(TrendIndex::exists(&dir));
        index.close().await.unwrap();

        let index = TrendIndex::open(&dir).await.unwrap();
        assert_eq!(index.len().await.unwrap(), 3);

        let info = index.info().await.unwrap();
        assert_eq!(info.embedding_model, "test-embed");
        assert_eq!(info.document_count, 3);
        assert!(info.age() < Duration::from_secs(60));

        let hits = index.search(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document, docs[0]);
        assert_eq!(hits[1].document, docs[2]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_mismatched_embeddings_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let result = TrendIndex::create(
            &tmp.path().join("idx"),
            &[doc("a", "http://a")],
            &[],
            "test-embed",
        )
        .await;
        assert!(matches!(
            result,
            Err(RagError::EmbeddingMismatch { expected: 1, actual: 0 })
        ));
    }

    #[tokio::test]
    async fn test_open_missing_database() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            TrendIndex::open(tmp.path()).await,
            Err(RagError::CorruptIndex { .. })
        ));
    }

    #[tokio::test]
    async fn test_shared_link_returned_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("idx");
        let docs = vec![
            doc("1 Topic X EntA 2024-01-01T00:00:00", "http://x"),
            doc("1 Topic X EntA 2024-01-01T00:00:09", "http://x"),
            doc("2 Topic Y EntA 2024-01-01T00:00:00", "http://y"),
        ];
        let vectors = vec![
            embedding(vec![0.9, 0.1]),
            embedding(vec![1.0, 0.0]),
            embedding(vec![0.0, 1.0]),
        ];

        let index = TrendIndex::create(&dir, &docs, &vectors, "m").await.unwrap();
        let hits = index.search(&[1.0, 0.0], 10).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document, docs[1]);
        assert_eq!(hits[1].document, docs[2]);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("idx");
        let docs = vec![doc("a", "http://a"), doc("b", "http://b")];
        let vectors = vec![embedding(vec![1.0, 0.0]), embedding(vec![0.0, 1.0])];

        let index = TrendIndex::create(&dir, &docs, &vectors, "m").await.unwrap();

        assert!(matches!(
            index.search(&[0.0, 1.0, 0.0], 10).await,
            Err(RagError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("idx");
        let docs = vec![doc("first", "http://1"), doc("second", "http://2")];
        let vectors = vec![embedding(vec![1.0, 0.0]), embedding(vec![1.0, 0.0])];

        let index = TrendIndex::create(&dir, &docs, &vectors, "m").await.unwrap();
        let hits = index.search(&[1.0, 0.0], 10).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.content, "first");
        assert_eq!(hits[1].document.content, "second");
        assert!(index.search(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }
}

//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! An index is a directory containing a single `index.db` file.

use super::{rank, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{Result, SankoError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// File name of the database inside an index directory.
pub const INDEX_FILE: &str = "index.db";

/// Metadata key recording which embedding model built the index.
pub const EMBEDDING_MODEL_KEY: &str = "embedding_model";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata_json TEXT NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);

    CREATE TABLE IF NOT EXISTS index_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// SQLite-based vector store.
///
/// The connection is not shareable across threads, so every call goes
/// through a mutex.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Path of the database file inside an index directory.
    pub fn index_path(index_dir: &Path) -> PathBuf {
        index_dir.join(INDEX_FILE)
    }

    /// Whether an index has been written to this directory.
    pub fn exists(index_dir: &Path) -> bool {
        index_dir.is_dir() && Self::index_path(index_dir).is_file()
    }

    /// Open the index in `index_dir`, creating the directory and schema if needed.
    #[instrument(skip_all)]
    pub fn create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;

        let path = Self::index_path(index_dir);
        let conn = Connection::open(&path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing index, or `None` if the directory holds no index.
    pub fn open_existing(index_dir: &Path) -> Result<Option<Self>> {
        if !Self::exists(index_dir) {
            debug!("No index found at {:?}", index_dir);
            return Ok(None);
        }
        Self::create(index_dir).map(Some)
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SankoError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Store an index-level metadata value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Read an index-level metadata value.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn insert_documents(conn: &Connection, docs: &[Document]) -> Result<()> {
        for doc in docs {
            let embedding_bytes = Self::embedding_to_bytes(&doc.embedding);
            let metadata_json = serde_json::to_string(&doc.metadata)?;

            conn.execute(
                r#"
                INSERT OR REPLACE INTO documents
                (id, source, content, metadata_json, embedding, chunk_order, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    doc.id.to_string(),
                    doc.source,
                    doc.content,
                    metadata_json,
                    embedding_bytes,
                    doc.chunk_order,
                    doc.indexed_at.to_rfc3339(),
                ],
            )?;
        }
        Ok(())
    }

    /// Replace the whole index contents with `docs` built by `embedding_model`.
    ///
    /// Runs in a single transaction, so on failure the previous contents stay
    /// in place. Returns how many documents were removed.
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    pub fn replace_all(&self, docs: &[Document], embedding_model: &str) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let removed = tx.execute("DELETE FROM documents", [])?;
        Self::insert_documents(&tx, docs)?;
        tx.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
            params![EMBEDDING_MODEL_KEY, embedding_model],
        )?;

        tx.commit()?;
        info!("Replaced {} documents with {}", removed, docs.len());
        Ok(removed)
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let metadata_json: String = row.get(3)?;
        let embedding_bytes: Vec<u8> = row.get(4)?;
        let indexed_at_str: String = row.get(6)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            source: row.get(1)?,
            content: row.get(2)?,
            metadata: serde_json::from_str::<HashMap<String, String>>(&metadata_json)
                .unwrap_or_default(),
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            chunk_order: row.get(5)?,
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        Self::insert_documents(&tx, docs)?;
        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, source, content, metadata_json, embedding, chunk_order, indexed_at
            FROM documents
            ORDER BY rowid
            "#,
        )?;

        let docs = stmt
            .query_map([], Self::row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let results = rank(docs, query_embedding, limit, min_score);

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(*) as chunk_count, MAX(indexed_at) as indexed_at
            FROM documents
            GROUP BY source
            ORDER BY source
            "#,
        )?;

        let sources = stmt
            .query_map([], |row| {
                let indexed_at_str: String = row.get(2)?;
                Ok(IndexedSource {
                    source: row.get(0)?,
                    chunk_count: row.get(1)?,
                    indexed_at: Self::parse_timestamp(&indexed_at_str),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sources)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::SOURCE_KEY;

    fn doc(source: &str, content: &str, embedding: Vec<f32>, order: i32) -> Document {
        let mut metadata = HashMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.to_string());
        Document::new(content.to_string(), metadata, embedding, order)
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert_batch(&[
                doc("docs/a.txt", "This is test content", vec![1.0, 0.0, 0.0], 0),
                doc("docs/a.txt", "More content", vec![0.0, 1.0, 0.0], 1),
            ])
            .await
            .unwrap();

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source, "docs/a.txt");
        assert_eq!(sources[0].chunk_count, 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.metadata[SOURCE_KEY], "docs/a.txt");

        let removed = store.replace_all(&[], "e5-small").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.document_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[
                doc("a.txt", "one", vec![1.0, 0.0], 0),
                doc("a.txt", "two", vec![1.0, 0.0], 1),
                doc("a.txt", "three", vec![1.0, 0.0], 2),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 3).await.unwrap();
        let contents: Vec<_> = results.iter().map(|r| r.document.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_on_disk_index_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("vectorstore");

        assert!(!SqliteVectorStore::exists(&index_dir));
        assert!(SqliteVectorStore::open_existing(&index_dir).unwrap().is_none());

        {
            let store = SqliteVectorStore::create(&index_dir).unwrap();
            store.set_meta(EMBEDDING_MODEL_KEY, "e5-small").unwrap();
            store
                .upsert_batch(&[doc("a.txt", "persisted", vec![0.5, 0.5], 0)])
                .await
                .unwrap();
        }

        assert!(SqliteVectorStore::exists(&index_dir));
        let reopened = SqliteVectorStore::open_existing(&index_dir).unwrap().unwrap();
        assert_eq!(reopened.document_count().await.unwrap(), 1);
        assert_eq!(
            reopened.get_meta(EMBEDDING_MODEL_KEY).unwrap().as_deref(),
            Some("e5-small")
        );
        assert_eq!(reopened.get_meta("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn test_replace_all_swaps_contents_and_records_model() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[doc("old.txt", "old", vec![1.0, 0.0], 0)])
            .await
            .unwrap();

        let removed = store
            .replace_all(&[doc("new.txt", "new", vec![0.0, 1.0], 0)], "e5-small")
            .unwrap();

        assert_eq!(removed, 1);
        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source, "new.txt");
        assert_eq!(store.get_meta(EMBEDDING_MODEL_KEY).unwrap().as_deref(), Some("e5-small"));
    }

    #[tokio::test]
    async fn test_failed_replace_all_keeps_previous_contents() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[
                doc("a.txt", "first", vec![1.0, 0.0], 0),
                doc("a.txt", "second", vec![0.0, 1.0], 1),
            ])
            .await
            .unwrap();
        store.set_meta(EMBEDDING_MODEL_KEY, "e5-small").unwrap();

        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_insert BEFORE INSERT ON documents \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result = store.replace_all(&[doc("b.txt", "replacement", vec![1.0, 1.0], 0)], "other");

        assert!(result.is_err());
        assert_eq!(store.document_count().await.unwrap(), 2);
        assert_eq!(store.list_sources().await.unwrap()[0].source, "a.txt");
        assert_eq!(store.get_meta(EMBEDDING_MODEL_KEY).unwrap().as_deref(), Some("e5-small"));
    }

    #[test]
    fn test_embedding_bytes_roundtrip_preserves_values() {
        let embedding = vec![0.25, -1.5, 3.0];
        let bytes = SqliteVectorStore::embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(SqliteVectorStore::bytes_to_embedding(&bytes), embedding);
    }
}

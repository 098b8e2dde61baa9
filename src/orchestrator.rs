//! Pipeline orchestrator for Sanko.
//!
//! Wires settings, prompts, and the embedder together: builds the index from a
//! documents directory and assembles query pipelines on top of it.

use crate::chunking::{split_documents, ChunkingConfig, TextSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SankoError};
use crate::llm::ChatModel;
use crate::loader::{directory_has_content, DirectoryLoader};
use crate::rag::{load_index, EmbeddedIndex, PipelineConfig, QueryPipeline, Retriever};
use crate::vector_store::{Document, SqliteVectorStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for Sanko.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Number of files read from the documents directory.
    pub files_loaded: usize,
    /// Number of chunks written to the index.
    pub chunks_indexed: usize,
    /// Where the index was written.
    pub index_dir: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);

        Ok(Self {
            settings,
            prompts,
            embedder,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(settings: Settings, prompts: Prompts, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            settings,
            prompts,
            embedder,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Build the index in `index_dir` from every document in `documents_dir`.
    ///
    /// Existing index contents are replaced. Nothing is written unless every
    /// chunk was embedded.
    #[instrument(skip(self))]
    pub async fn ingest(&self, documents_dir: &Path, index_dir: &Path) -> Result<IngestReport> {
        if !documents_dir.is_dir() {
            return Err(SankoError::Ingest(format!(
                "documents directory not found: {}",
                documents_dir.display()
            )));
        }
        if !directory_has_content(documents_dir) {
            return Err(SankoError::Ingest(format!(
                "documents directory is empty: {}",
                documents_dir.display()
            )));
        }

        let documents = DirectoryLoader::new(&self.settings.ingest.extensions).load(documents_dir)?;
        info!("Loaded {} documents from {:?}", documents.len(), documents_dir);

        let splitter = TextSplitter::new(ChunkingConfig {
            chunk_size: self.settings.ingest.chunk_size,
            chunk_overlap: self.settings.ingest.chunk_overlap,
        })?;
        let chunks = split_documents(&splitter, &documents);

        if chunks.is_empty() {
            return Err(SankoError::Ingest(format!(
                "no text could be extracted from {}",
                documents_dir.display()
            )));
        }

        info!("Embedding {} chunks", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(SankoError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents_to_store: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::new(chunk.content, chunk.metadata, embedding, chunk.order))
            .collect();

        let store = SqliteVectorStore::create(index_dir)?;
        let removed = store.replace_all(&documents_to_store, self.embedder.model_name())?;
        if removed > 0 {
            info!("Replaced {} previously indexed chunks", removed);
        }
        let indexed = documents_to_store.len();

        info!("Indexed {} chunks into {:?}", indexed, index_dir);

        Ok(IngestReport {
            files_loaded: documents.len(),
            chunks_indexed: indexed,
            index_dir: index_dir.to_path_buf(),
        })
    }

    /// Load the index in `index_dir`, if one exists.
    pub fn open_index(&self, index_dir: &Path) -> Result<Option<EmbeddedIndex>> {
        load_index(index_dir, self.embedder.clone(), self.embedder.model_name())
    }

    /// Build a query pipeline over the index in `index_dir`.
    ///
    /// Runs in RAG mode when an index loads and in plain mode when none exists.
    /// An index that fails to load is logged and treated as absent.
    pub fn query_pipeline(
        &self,
        chat_model: Arc<dyn ChatModel>,
        index_dir: &Path,
        k: usize,
    ) -> Result<QueryPipeline> {
        let config = PipelineConfig::from_settings(&self.settings, &self.prompts)?;

        let retriever = match self.open_index(index_dir) {
            Ok(Some(index)) => Some(Retriever::new(Arc::new(index), k)),
            Ok(None) => None,
            Err(e) => {
                warn!("Index at {:?} could not be loaded, answering without retrieval: {}", index_dir, e);
                None
            }
        };

        Ok(QueryPipeline::new(chat_model, retriever, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::KeywordEmbedder;
    use crate::llm::Message;
    use crate::rag::OperatingMode;
    use crate::vector_store::{VectorStore, EMBEDDING_MODEL_KEY};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    /// Replies with a fixed answer and keeps the last user message.
    struct CannedModel {
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, messages: &[Message], _max_tokens: u32) -> Result<String> {
            *self.last_prompt.lock().unwrap() = messages.last().map(|m| m.content.clone());
            Ok("Tokyo".to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(KeywordEmbedder::new(&["tokyo", "kyoto", "capital", "temple"])),
        )
    }

    fn write_documents(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("tokyo.txt"), "Tokyo is the capital of Japan.").unwrap();
        fs::write(dir.join("kyoto.md"), "Kyoto has a famous temple.").unwrap();
    }

    #[tokio::test]
    async fn test_ingest_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let documents_dir = dir.path().join("documents");
        let index_dir = dir.path().join("vectorstore");
        write_documents(&documents_dir);

        let orchestrator = orchestrator();
        let report = assert_ok!(orchestrator.ingest(&documents_dir, &index_dir).await);
        assert_eq!(report.files_loaded, 2);
        assert_eq!(report.chunks_indexed, 2);
        assert!(SqliteVectorStore::exists(&index_dir));

        let model = Arc::new(CannedModel {
            last_prompt: Mutex::new(None),
        });
        let pipeline = orchestrator.query_pipeline(model.clone(), &index_dir, 1).unwrap();
        assert_eq!(pipeline.mode(), OperatingMode::Rag);

        let result = assert_ok!(pipeline.answer("What is the capital? Tokyo?").await);
        assert_eq!(result.answer, "Tokyo");
        assert_eq!(result.source_documents.len(), 1);
        assert!(result.source_documents[0].source().unwrap().ends_with("tokyo.txt"));

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Tokyo is the capital of Japan."));
        assert!(!prompt.contains("Kyoto"));
    }

    #[tokio::test]
    async fn test_reingest_replaces_index() {
        let dir = tempfile::tempdir().unwrap();
        let documents_dir = dir.path().join("documents");
        let index_dir = dir.path().join("vectorstore");
        write_documents(&documents_dir);

        let orchestrator = orchestrator();
        orchestrator.ingest(&documents_dir, &index_dir).await.unwrap();
        fs::remove_file(documents_dir.join("kyoto.md")).unwrap();
        orchestrator.ingest(&documents_dir, &index_dir).await.unwrap();

        let index = orchestrator.open_index(&index_dir).unwrap().unwrap();
        assert_eq!(index.store().document_count().await.unwrap(), 1);

        let store = SqliteVectorStore::open_existing(&index_dir).unwrap().unwrap();
        assert_eq!(
            store.get_meta(EMBEDDING_MODEL_KEY).unwrap().as_deref(),
            Some("keyword-test")
        );
    }

    #[tokio::test]
    async fn test_failed_reingest_keeps_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let documents_dir = dir.path().join("documents");
        let index_dir = dir.path().join("vectorstore");
        write_documents(&documents_dir);

        let orchestrator = orchestrator();
        orchestrator.ingest(&documents_dir, &index_dir).await.unwrap();

        {
            let conn = rusqlite::Connection::open(SqliteVectorStore::index_path(&index_dir)).unwrap();
            conn.execute_batch(
                "CREATE TRIGGER fail_insert BEFORE INSERT ON documents \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();
        }

        fs::write(documents_dir.join("osaka.txt"), "Osaka is known for food.").unwrap();
        let result = orchestrator.ingest(&documents_dir, &index_dir).await;
        assert!(matches!(result, Err(SankoError::Database(_))));

        let index = orchestrator.open_index(&index_dir).unwrap().unwrap();
        assert_eq!(index.store().document_count().await.unwrap(), 2);
        let sources: Vec<_> = index
            .store()
            .list_sources()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.source)
            .collect();
        assert!(sources.iter().any(|s| s.ends_with("tokyo.txt")));
        assert!(!sources.iter().any(|s| s.ends_with("osaka.txt")));
    }

    #[tokio::test]
    async fn test_ingest_rejects_missing_or_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("vectorstore");
        let orchestrator = orchestrator();

        let missing = orchestrator.ingest(&dir.path().join("absent"), &index_dir).await;
        assert!(matches!(missing, Err(SankoError::Ingest(_))));

        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        fs::write(empty.join(".hidden"), "secret").unwrap();
        let result = orchestrator.ingest(&empty, &index_dir).await;
        assert!(matches!(result, Err(SankoError::Ingest(_))));

        assert!(!SqliteVectorStore::exists(&index_dir));
    }

    #[tokio::test]
    async fn test_ingest_rejects_directory_without_text() {
        let dir = tempfile::tempdir().unwrap();
        let documents_dir = dir.path().join("documents");
        fs::create_dir(&documents_dir).unwrap();
        fs::write(documents_dir.join("photo.jpg"), [0u8, 1, 2]).unwrap();
        fs::write(documents_dir.join("blank.txt"), "   \n\n ").unwrap();

        let result = orchestrator()
            .ingest(&documents_dir, &dir.path().join("vectorstore"))
            .await;
        assert!(matches!(result, Err(SankoError::Ingest(_))));
    }

    #[test]
    fn test_pipeline_without_index_is_plain() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(CannedModel {
            last_prompt: Mutex::new(None),
        });

        let pipeline = orchestrator()
            .query_pipeline(model, &dir.path().join("vectorstore"), 3)
            .unwrap();
        assert_eq!(pipeline.mode(), OperatingMode::Plain);
    }

    #[test]
    fn test_unreadable_index_falls_back_to_plain() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(SqliteVectorStore::index_path(dir.path()), "not a database ".repeat(100)).unwrap();

        let orchestrator = orchestrator();
        assert!(orchestrator.open_index(dir.path()).is_err());

        let model = Arc::new(CannedModel {
            last_prompt: Mutex::new(None),
        });
        let pipeline = orchestrator.query_pipeline(model, dir.path(), 3).unwrap();
        assert_eq!(pipeline.mode(), OperatingMode::Plain);
    }
}

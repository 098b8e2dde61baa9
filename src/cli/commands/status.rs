//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore, EMBEDDING_MODEL_KEY};
use anyhow::Result;

/// Run the status command.
pub async fn run_status(index: Option<String>, settings: Settings) -> Result<()> {
    let index_dir = match index {
        Some(dir) => Settings::expand_path(&dir),
        None => settings.index_dir(),
    };

    let Some(store) = SqliteVectorStore::open_existing(&index_dir)? else {
        Output::info(&format!(
            "No index at {}. Use 'sanko ingest' to build one; until then questions are answered without retrieval.",
            index_dir.display()
        ));
        return Ok(());
    };

    let sources = match store.list_sources().await {
        Ok(sources) => sources,
        Err(e) => {
            Output::error(&format!("Failed to read index: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Index");
    Output::kv("Path", &index_dir.display().to_string());
    if let Some(model) = store.get_meta(EMBEDDING_MODEL_KEY)? {
        Output::kv("Embedding model", &model);
        if model != settings.embedding.model {
            Output::warning(&format!(
                "Configured embedding model is '{}'; re-run 'sanko ingest' to rebuild.",
                settings.embedding.model
            ));
        }
    }
    Output::kv("Chunks", &store.document_count().await?.to_string());

    if sources.is_empty() {
        Output::info("The index is empty.");
        return Ok(());
    }

    Output::header(&format!("Sources ({})", sources.len()));
    for source in &sources {
        Output::list_item(&format!(
            "{} ({} chunks, {})",
            source.source,
            source.chunk_count,
            source.indexed_at.format("%Y-%m-%d %H:%M")
        ));
    }

    Ok(())
}

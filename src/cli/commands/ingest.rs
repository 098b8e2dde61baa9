//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(documents: Option<String>, index: Option<String>, settings: Settings) -> Result<()> {
    let documents_dir = match documents {
        Some(dir) => Settings::expand_path(&dir),
        None => settings.documents_dir(),
    };
    let index_dir = match index {
        Some(dir) => Settings::expand_path(&dir),
        None => settings.index_dir(),
    };

    if let Err(e) = preflight::check(Operation::Ingest { documents_dir: &documents_dir }, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Indexing {}...", documents_dir.display()));
    let outcome = orchestrator.ingest(&documents_dir, &index_dir).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(report) => {
            Output::success("Index built.");
            Output::kv("Files", &report.files_loaded.to_string());
            Output::kv("Chunks", &report.chunks_indexed.to_string());
            Output::kv("Index", &report.index_dir.display().to_string());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            Err(e.into())
        }
    }
}

//! Pre-flight checks before expensive operations.
//!
//! Validates that required directories and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SankoError};
use crate::loader::directory_has_content;
use std::path::Path;
use url::Url;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// Ingestion needs documents and an embeddings endpoint.
    Ingest { documents_dir: &'a Path },
    /// Answering questions needs a chat endpoint and an embeddings endpoint.
    Query,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation<'_>, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest { documents_dir } => {
            check_documents(documents_dir)?;
            check_endpoint("embedding.api_base", &settings.embedding.api_base)?;
        }
        Operation::Query => {
            check_endpoint("llm.api_base", &settings.llm.api_base)?;
            check_endpoint("embedding.api_base", &settings.embedding.api_base)?;
        }
    }
    Ok(())
}

fn check_documents(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(SankoError::Config(format!(
            "Documents directory not found: {}. Create it or set ingest.documents_dir.",
            dir.display()
        )));
    }
    if !directory_has_content(dir) {
        return Err(SankoError::Config(format!(
            "Documents directory is empty: {}. Add .txt or .md files first.",
            dir.display()
        )));
    }
    Ok(())
}

/// Check that an endpoint is an http(s) URL.
fn check_endpoint(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| SankoError::Config(format!("{} is not a valid URL ({}): {}", key, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SankoError::Config(format!(
            "{} must use http or https, got '{}'",
            key, other
        ))),
    }
}

//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, QueryArgs};
use crate::config::Settings;
use crate::error::QueryError;
use crate::llm::OpenAIChatModel;
use crate::orchestrator::Orchestrator;
use crate::rag::{QueryPipeline, QueryResult};
use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the ask command.
pub async fn run_ask(question: &str, args: &QueryArgs, settings: Settings) -> Result<()> {
    let pipeline = build_pipeline(args, settings)?;

    let spinner = Output::spinner("Thinking...");
    let outcome = answer_interruptibly(&pipeline, question).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(result) => {
            Output::query_result(&result);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            Err(e.into())
        }
    }
}

/// Check configuration and build a query pipeline for the given options.
pub(super) fn build_pipeline(args: &QueryArgs, settings: Settings) -> Result<QueryPipeline> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'sanko config show' to inspect the effective configuration.");
        return Err(e.into());
    }

    let index_dir = match &args.index {
        Some(dir) => Settings::expand_path(dir),
        None => settings.index_dir(),
    };
    let k = args.top_k.unwrap_or(settings.rag.top_k);

    let mut chat_model = OpenAIChatModel::from_settings(&settings.llm)?;
    if let Some(model) = &args.model {
        chat_model = chat_model.with_model(model);
    }

    let orchestrator = Orchestrator::new(settings)?;
    Ok(orchestrator.query_pipeline(Arc::new(chat_model), &index_dir, k)?)
}

/// Answer a question, cancelling it if the user presses Ctrl+C.
pub(super) async fn answer_interruptibly(
    pipeline: &QueryPipeline,
    question: &str,
) -> std::result::Result<QueryResult, QueryError> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = pipeline.answer_with_cancel(question, &cancel).await;
    watcher.abort();
    outcome
}

//! The query pipeline: mode selection, retrieval, prompt assembly, completion.

use super::{OperatingMode, PromptAssembler, QueryResult, Retriever};
use crate::config::{Prompts, Settings};
use crate::error::{QueryError, Result};
use crate::llm::{ChatModel, Message};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Separator placed between retrieved chunks in the grounding context.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Pipeline-wide configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// System preamble sent with every query.
    pub system_prompt: String,
    /// Grounding template used in RAG mode.
    pub assembler: PromptAssembler,
    /// Completion length limit passed to the chat model.
    pub max_tokens: u32,
    /// Upper bound on one retrieval call.
    pub retrieval_timeout: Duration,
    /// Upper bound on one completion call.
    pub completion_timeout: Duration,
}

impl PipelineConfig {
    pub fn new(system_prompt: impl Into<String>, assembler: PromptAssembler) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            assembler,
            max_tokens: 1024,
            retrieval_timeout: Duration::from_secs(60),
            completion_timeout: Duration::from_secs(300),
        }
    }

    /// Build from settings and loaded prompts, substituting prompt variables.
    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Result<Self> {
        let variables = settings.prompt_variables();
        let system_prompt = Prompts::render(&prompts.rag.system, &variables);
        let assembler = PromptAssembler::new(&prompts.rag.user, &variables)?;

        Ok(Self {
            system_prompt,
            assembler,
            max_tokens: settings.llm.max_tokens,
            retrieval_timeout: settings.rag.retrieval_timeout(),
            completion_timeout: settings.rag.completion_timeout(),
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeouts(mut self, retrieval: Duration, completion: Duration) -> Self {
        self.retrieval_timeout = retrieval;
        self.completion_timeout = completion;
        self
    }
}

/// Answers questions, grounded in retrieved chunks when a retriever is present.
///
/// The mode is fixed when the pipeline is built. The pipeline keeps no
/// per-query state, so one instance can serve concurrent queries.
pub struct QueryPipeline {
    chat_model: Arc<dyn ChatModel>,
    retriever: Option<Retriever>,
    config: PipelineConfig,
}

impl QueryPipeline {
    /// Create a pipeline. Without a retriever it runs in plain mode.
    pub fn new(chat_model: Arc<dyn ChatModel>, retriever: Option<Retriever>, config: PipelineConfig) -> Self {
        Self {
            chat_model,
            retriever,
            config,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        match self.retriever {
            Some(_) => OperatingMode::Rag,
            None => OperatingMode::Plain,
        }
    }

    /// Answer a query.
    pub async fn answer(&self, query: &str) -> std::result::Result<QueryResult, QueryError> {
        self.answer_with_cancel(query, &CancellationToken::new()).await
    }

    /// Answer a query, giving up with [`QueryError::Cancelled`] once `cancel` fires.
    #[instrument(skip(self, query, cancel), fields(mode = %self.mode()))]
    pub async fn answer_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<QueryResult, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::InvalidInput("query must not be empty".to_string()));
        }

        info!("Answering query");

        let (user_content, source_documents) = match &self.retriever {
            None => (query.to_string(), Vec::new()),
            Some(retriever) => {
                let chunks = bounded(
                    "retrieval",
                    self.config.retrieval_timeout,
                    cancel,
                    retriever.retrieve(query),
                )
                .await?
                .inspect_err(|e| warn!("{}", e))?;

                debug!("Using {} retrieved chunks as context", chunks.len());

                let context = chunks
                    .iter()
                    .map(|c| c.content.as_str())
                    .collect::<Vec<_>>()
                    .join(CONTEXT_SEPARATOR);
                (self.config.assembler.render(&context, query), chunks)
            }
        };

        let messages = [
            Message::system(self.config.system_prompt.clone()),
            Message::user(user_content),
        ];

        let answer = bounded(
            "completion",
            self.config.completion_timeout,
            cancel,
            self.chat_model.complete(&messages, self.config.max_tokens),
        )
        .await?
        .map_err(|e| {
            warn!("Chat model failed: {}", e);
            QueryError::ChatModelFailed(e)
        })?;

        if answer.trim().is_empty() {
            warn!("Chat model returned an empty completion");
            return Err(QueryError::QueryFailed(
                "chat model returned an empty completion".to_string(),
            ));
        }

        Ok(QueryResult {
            answer,
            source_documents,
        })
    }
}

/// Run one collaborator call under a timeout, observing cancellation.
///
/// Cancellation and timeouts become [`QueryError::Cancelled`]; a panic inside
/// the call becomes [`QueryError::QueryFailed`].
async fn bounded<F, T>(
    stage: &str,
    limit: Duration,
    cancel: &CancellationToken,
    call: F,
) -> std::result::Result<T, QueryError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("{} cancelled", stage);
            Err(QueryError::Cancelled(format!("{} was cancelled", stage)))
        }
        outcome = tokio::time::timeout(limit, AssertUnwindSafe(call).catch_unwind()) => match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => {
                warn!("{} panicked", stage);
                Err(QueryError::QueryFailed(format!("{} panicked", stage)))
            }
            Err(_) => {
                warn!("{} timed out after {:?}", stage, limit);
                Err(QueryError::Cancelled(format!("{} timed out after {:?}", stage, limit)))
            }
        },
    }
}

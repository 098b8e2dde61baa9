//! Chat completions over an OpenAI-compatible endpoint.

use super::{ChatModel, Message, Role};
use crate::config::LlmSettings;
use crate::error::{Result, SankoError};
use crate::openai::create_client_with_timeout;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat model served by llama.cpp, Ollama, LM Studio or any other
/// OpenAI-compatible server.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIChatModel {
    /// Create a chat model from settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let client = create_client_with_timeout(
            &settings.api_base,
            settings.api_key.as_deref(),
            Duration::from_secs(settings.request_timeout_secs),
        )?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
        let built: std::result::Result<ChatCompletionRequestMessage, OpenAIError> = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(Into::into),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(Into::into),
        };
        built.map_err(|e| SankoError::ChatModel(e.to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[Message], max_tokens: u32) -> Result<String> {
        let request_messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        #[allow(deprecated)]
        args.model(&self.model)
            .messages(request_messages)
            .max_tokens(max_tokens);
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let request = args
            .build()
            .map_err(|e| SankoError::ChatModel(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            SankoError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SankoError::ChatModel("Response contained no choices".to_string()))?;

        let content = choice.message.content.unwrap_or_default();
        debug!("Completion returned {} characters", content.chars().count());
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Client;
use crate::backend::{ChatModel, ModelSettings};
use crate::error::GenerationError;
use crate::prompt::{Message, Prompt};

#[derive(Serialize, Debug, Clone)]
pub(crate) struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(flatten)]
    token_limit: BTreeMap<&'static str, u32>,
}

impl<'a> CompletionRequest<'a> {
    pub(crate) fn new(settings: &'a ModelSettings, prompt: &'a Prompt) -> Self {
        Self {
            model: &settings.model,
            messages: &prompt.messages,
            temperature: settings.temperature,
            token_limit: settings.token_limit.as_field(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct CompletionChoice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct CompletionUsage {
    pub completion_tokens: i64,
    pub prompt_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

impl CompletionResponse {
    /// The first choice's text. Usage and finish reason are only logged.
    pub(crate) fn into_text(self) -> Result<String, GenerationError> {
        if let Some(usage) = &self.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "openai usage"
            );
        }

        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(GenerationError::empty_response)?;

        if let Some(reason) = &choice.finish_reason {
            tracing::debug!(finish_reason = %reason, "openai finish reason");
        }

        choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(GenerationError::empty_response)
    }
}

impl Client {
    pub(crate) async fn completion(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, GenerationError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_reply(status, &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| GenerationError::new(format!("malformed provider response: {e}")))
    }
}

#[async_trait]
impl ChatModel for Client {
    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let request = CompletionRequest::new(&self.settings, prompt);
        self.completion(request).await?.into_text()
    }
}

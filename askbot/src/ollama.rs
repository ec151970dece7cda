use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{ChatModel, ModelSettings};
use crate::error::{ConfigurationError, GenerationError};
use crate::prompt::{Message, Prompt};
use crate::APP_USER_AGENT;

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    #[serde(flatten)]
    token_limit: BTreeMap<&'static str, u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

impl<'a> ChatRequest<'a> {
    fn new(settings: &'a ModelSettings, prompt: &'a Prompt) -> Self {
        Self {
            model: &settings.model,
            messages: &prompt.messages,
            stream: false,
            options: ChatOptions {
                temperature: settings.temperature,
                token_limit: settings.token_limit.as_field(),
            },
        }
    }
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

/// HTTP client for a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|e| ConfigurationError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn chat(
        &self,
        settings: &ModelSettings,
        prompt: &Prompt,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest::new(settings, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_reply(status, &body));
        }

        let body = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::new(format!("malformed provider response: {e}")))?;

        tracing::debug!(
            prompt_tokens = chat.prompt_eval_count,
            completion_tokens = chat.eval_count,
            done_reason = chat.done_reason.as_deref(),
            "ollama usage"
        );

        chat.message
            .map(|message| message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(GenerationError::empty_response)
    }

    /// Names of the models pulled into the local server.
    pub async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_reply(status, &body));
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }
}

/// An [`OllamaClient`] bound to one set of model settings.
pub(crate) struct LocalChat {
    client: OllamaClient,
    settings: ModelSettings,
}

impl LocalChat {
    pub(crate) fn new(client: OllamaClient, settings: ModelSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ChatModel for LocalChat {
    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        self.client.chat(&self.settings, prompt).await
    }
}

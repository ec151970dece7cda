use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod backend;
pub mod transcript;

pub use backend::{Backend, UnknownBackend};
pub use transcript::{Sender, Transcript, TranscriptEntry};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 50..=500;

/// The sidebar settings sent along with every question.
///
/// `backend` stays a string on the wire so that an unknown value reaches the
/// server and is reported as a configuration error.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub backend: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl ChatSettings {
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            backend: backend.as_str().to_string(),
            model: backend.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            credential: None,
        }
    }

    /// Points `model` at an entry of `available` when the current choice is
    /// not offered. An empty list leaves the settings alone.
    pub fn prefer_available_model(&mut self, available: &[String]) {
        if available.iter().any(|m| *m == self.model) {
            return;
        }
        if let Some(first) = available.first() {
            self.model = first.clone();
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChatRequest {
    pub session: Uuid,
    pub question: String,
    pub settings: ChatSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChatResponse {
    pub session: Uuid,
    pub answer: String,
    pub transcript: Transcript,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    Configuration,
    Generation,
}

/// Body of every non-2xx reply from `/api/v0/chat`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChatFailure {
    pub kind: FailureKind,
    pub message: String,
    pub transcript: Transcript,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SessionResponse {
    pub session: Uuid,
    pub transcript: Transcript,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BackendInfo {
    pub backend: Backend,
    pub label: String,
    pub requires_credential: bool,
    pub models: Vec<String>,
}

impl From<Backend> for BackendInfo {
    fn from(backend: Backend) -> Self {
        Self {
            backend,
            label: backend.display_name().to_string(),
            requires_credential: backend.is_hosted(),
            models: backend.models().iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProfileResponse {
    pub title: String,
    pub greeting: String,
    pub backends: Vec<BackendInfo>,
    pub defaults: ChatSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

use miette::Diagnostic;
use serde_json::Value;
use shared::UnknownBackend;
use thiserror::Error;

/// The request cannot be turned into a model client. Always raised before any
/// network traffic.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("missing credential")]
    #[diagnostic(
        code(askbot::config::missing_credential),
        help("enter an API key for the hosted backend")
    )]
    MissingCredential,

    #[error("unsupported backend: {0}")]
    #[diagnostic(code(askbot::config::unsupported_backend))]
    UnsupportedBackend(String),

    #[error("model name is empty")]
    #[diagnostic(code(askbot::config::missing_model))]
    MissingModel,

    #[error("temperature {0} is outside 0.0..=1.0")]
    #[diagnostic(code(askbot::config::temperature))]
    TemperatureOutOfRange(f32),

    #[error("max tokens {0} is outside 50..=500")]
    #[diagnostic(code(askbot::config::max_tokens))]
    MaxTokensOutOfRange(u32),

    #[error("could not build HTTP client: {0}")]
    #[diagnostic(code(askbot::config::client))]
    Client(String),
}

impl From<UnknownBackend> for ConfigurationError {
    fn from(err: UnknownBackend) -> Self {
        ConfigurationError::UnsupportedBackend(err.0)
    }
}

/// The provider call failed or answered with something unusable.
///
/// `message` is the provider's own error text whenever it sent one.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(code(askbot::generation))]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn empty_response() -> Self {
        Self::new("provider returned an empty response")
    }

    /// Builds the error for a non-success reply, preferring the message the
    /// provider put in its JSON error envelope.
    pub(crate) fn from_reply(status: reqwest::StatusCode, body: &str) -> Self {
        if let Some(message) = provider_message(body) {
            return Self::new(message);
        }

        let body = body.trim();
        if body.is_empty() {
            Self::new(status.to_string())
        } else {
            Self::new(body)
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

// OpenAI nests the text in `error.message`, Ollama sends `error` as a string.
fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Generation(#[from] GenerationError),
}

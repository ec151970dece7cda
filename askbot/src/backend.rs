use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use shared::{Backend, ChatSettings, MAX_TOKENS_RANGE, TEMPERATURE_RANGE};

use crate::config::Endpoints;
use crate::error::{ConfigurationError, GenerationError};
use crate::ollama::{LocalChat, OllamaClient};
use crate::openai;
use crate::prompt::Prompt;

/// Everything needed to answer one question.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub question: String,
    pub backend: Backend,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub credential: Option<String>,
}

impl GenerationRequest {
    pub fn from_settings(
        question: impl Into<String>,
        settings: &ChatSettings,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            question: question.into(),
            backend: settings.backend.parse()?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            credential: settings.credential.clone(),
        })
    }
}

/// The output token limit, under the name the backend expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLimit {
    pub param: &'static str,
    pub value: u32,
}

impl TokenLimit {
    pub fn param_for(backend: Backend) -> &'static str {
        match backend {
            Backend::OpenAi => "max_tokens",
            Backend::Ollama => "num_predict",
        }
    }

    pub fn for_backend(backend: Backend, value: u32) -> Self {
        Self {
            param: Self::param_for(backend),
            value,
        }
    }

    /// A one-entry map, flattened into request bodies.
    pub(crate) fn as_field(&self) -> BTreeMap<&'static str, u32> {
        BTreeMap::from([(self.param, self.value)])
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A request after validation, with backend-specific naming applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub backend: Backend,
    pub model: String,
    pub temperature: f32,
    pub token_limit: TokenLimit,
    pub credential: Option<Credential>,
}

/// A configured model client: takes a prompt, returns the reply text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn settings(&self) -> &ModelSettings;

    async fn invoke(&self, prompt: &Prompt) -> Result<String, GenerationError>;
}

pub trait ModelBuilder: Send + Sync {
    fn build(&self, request: &GenerationRequest) -> Result<Box<dyn ChatModel>, ConfigurationError>;
}

#[derive(Debug, Clone)]
pub struct BackendAdapter {
    endpoints: Endpoints,
    enabled: Vec<Backend>,
}

impl BackendAdapter {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            enabled: Backend::all().to_vec(),
        }
    }

    /// Restricts the adapter to `backends`; anything else is unsupported.
    pub fn with_backends(mut self, backends: &[Backend]) -> Self {
        self.enabled = backends.to_vec();
        self
    }

    pub fn enabled(&self) -> &[Backend] {
        &self.enabled
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn resolve(&self, request: &GenerationRequest) -> Result<ModelSettings, ConfigurationError> {
        let backend = request.backend;
        if !self.enabled.contains(&backend) {
            return Err(ConfigurationError::UnsupportedBackend(
                backend.as_str().to_string(),
            ));
        }

        if request.model.trim().is_empty() {
            return Err(ConfigurationError::MissingModel);
        }

        if !TEMPERATURE_RANGE.contains(&request.temperature) {
            return Err(ConfigurationError::TemperatureOutOfRange(
                request.temperature,
            ));
        }

        if !MAX_TOKENS_RANGE.contains(&request.max_tokens) {
            return Err(ConfigurationError::MaxTokensOutOfRange(request.max_tokens));
        }

        let credential = if backend.is_hosted() {
            let key = request
                .credential
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .ok_or(ConfigurationError::MissingCredential)?;
            Some(Credential(key.to_string()))
        } else {
            None
        };

        Ok(ModelSettings {
            backend,
            model: request.model.clone(),
            temperature: request.temperature,
            token_limit: TokenLimit::for_backend(backend, request.max_tokens),
            credential,
        })
    }
}

impl ModelBuilder for BackendAdapter {
    fn build(&self, request: &GenerationRequest) -> Result<Box<dyn ChatModel>, ConfigurationError> {
        let settings = self.resolve(request)?;

        tracing::debug!(
            backend = %settings.backend,
            model = %settings.model,
            token_param = settings.token_limit.param,
            "building model client"
        );

        match (settings.backend, settings.credential.clone()) {
            (Backend::OpenAi, Some(credential)) => {
                let config = openai::Config::new(&self.endpoints.openai, credential);
                Ok(Box::new(config.client(settings)?))
            }
            (Backend::OpenAi, None) => Err(ConfigurationError::MissingCredential),
            (Backend::Ollama, _) => {
                let client = OllamaClient::new(&self.endpoints.ollama)?;
                Ok(Box::new(LocalChat::new(client, settings)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(backend: Backend, credential: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            question: "What is 2+2?".to_string(),
            backend,
            model: backend.default_model().to_string(),
            temperature: 0.7,
            max_tokens: 150,
            credential: credential.map(str::to_string),
        }
    }

    fn adapter() -> BackendAdapter {
        BackendAdapter::new(Endpoints::default())
    }

    #[test]
    fn hosted_uses_max_tokens() {
        let settings = adapter()
            .resolve(&request(Backend::OpenAi, Some("sk-test")))
            .unwrap();

        assert_eq!(settings.token_limit.param, "max_tokens");
        assert_eq!(settings.token_limit.value, 150);
        assert_eq!(settings.credential.unwrap().expose(), "sk-test");
    }

    #[test]
    fn hosted_build_succeeds_with_credential() {
        let model = adapter()
            .build(&request(Backend::OpenAi, Some("sk-test")))
            .unwrap();

        assert_eq!(model.settings().backend, Backend::OpenAi);
        assert_eq!(model.settings().token_limit.param, "max_tokens");
    }

    #[test]
    fn hosted_requires_a_credential() {
        for credential in [None, Some(""), Some("   ")] {
            let err = adapter()
                .build(&request(Backend::OpenAi, credential))
                .err()
                .unwrap();
            assert_eq!(err, ConfigurationError::MissingCredential);
            assert_eq!(err.to_string(), "missing credential");
        }
    }

    #[test]
    fn local_renames_the_token_limit() {
        let model = adapter().build(&request(Backend::Ollama, None)).unwrap();
        assert_eq!(model.settings().token_limit.param, "num_predict");
    }

    #[test]
    fn local_ignores_the_credential() {
        let adapter = adapter();
        let without = adapter.resolve(&request(Backend::Ollama, None)).unwrap();
        let with = adapter
            .resolve(&request(Backend::Ollama, Some("sk-ignored")))
            .unwrap();

        assert_eq!(without, with);
        assert!(with.credential.is_none());
    }

    #[test]
    fn disabled_backend_is_unsupported() {
        let adapter = adapter().with_backends(&[Backend::Ollama]);
        let err = adapter
            .build(&request(Backend::OpenAi, Some("sk-test")))
            .err()
            .unwrap();

        assert_eq!(
            err,
            ConfigurationError::UnsupportedBackend("openai".to_string())
        );
    }

    #[test]
    fn unknown_backend_string_is_unsupported() {
        let mut settings = ChatSettings::for_backend(Backend::Ollama);
        settings.backend = "anthropic".to_string();

        let err = GenerationRequest::from_settings("hi", &settings).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnsupportedBackend("anthropic".to_string())
        );
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let adapter = adapter();

        let mut hot = request(Backend::Ollama, None);
        hot.temperature = 1.5;
        assert_eq!(
            adapter.resolve(&hot).unwrap_err(),
            ConfigurationError::TemperatureOutOfRange(1.5)
        );

        let mut long = request(Backend::Ollama, None);
        long.max_tokens = 10_000;
        assert_eq!(
            adapter.resolve(&long).unwrap_err(),
            ConfigurationError::MaxTokensOutOfRange(10_000)
        );

        let mut unnamed = request(Backend::Ollama, None);
        unnamed.model = " ".to_string();
        assert_eq!(
            adapter.resolve(&unnamed).unwrap_err(),
            ConfigurationError::MissingModel
        );
    }

    #[test]
    fn slider_bounds_are_accepted() {
        let adapter = adapter();
        for (temperature, max_tokens) in [(0.0, 50), (1.0, 500)] {
            let mut req = request(Backend::Ollama, None);
            req.temperature = temperature;
            req.max_tokens = max_tokens;
            assert!(adapter.resolve(&req).is_ok());
        }
    }

    #[test]
    fn credential_is_redacted_in_debug_output() {
        let settings = adapter()
            .resolve(&request(Backend::OpenAi, Some("sk-secret")))
            .unwrap();
        let debug = format!("{settings:?}");

        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("Credential(***)"));
    }

    #[test]
    fn token_limit_field_uses_the_param_name() {
        let field = TokenLimit::for_backend(Backend::Ollama, 42).as_field();
        assert_eq!(field.get("num_predict"), Some(&42));
        assert_eq!(field.len(), 1);
    }
}

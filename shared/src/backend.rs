use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"];
pub const OLLAMA_MODELS: &[&str] = &["gemma:2b", "llama2:latest"];

/// The model-serving target a question is sent to.
///
/// `OpenAi` is the hosted API and needs a credential, `Ollama` is a model
/// server on the local machine and never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenAi,
    Ollama,
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("unknown backend: {0}")]
pub struct UnknownBackend(pub String);

impl Backend {
    pub fn all() -> [Backend; 2] {
        [Backend::OpenAi, Backend::Ollama]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Ollama => "ollama",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::OpenAi => "OpenAI",
            Backend::Ollama => "Ollama",
        }
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self, Backend::OpenAi)
    }

    /// Models offered in the model dropdown before anything is fetched live.
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Backend::OpenAi => OPENAI_MODELS,
            Backend::Ollama => OLLAMA_MODELS,
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0]
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "hosted" => Ok(Backend::OpenAi),
            "ollama" | "local" => Ok(Backend::Ollama),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("openai".parse::<Backend>(), Ok(Backend::OpenAi));
        assert_eq!("OpenAI".parse::<Backend>(), Ok(Backend::OpenAi));
        assert_eq!("hosted".parse::<Backend>(), Ok(Backend::OpenAi));
        assert_eq!(" Ollama ".parse::<Backend>(), Ok(Backend::Ollama));
        assert_eq!("local".parse::<Backend>(), Ok(Backend::Ollama));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "anthropic".parse::<Backend>().unwrap_err();
        assert_eq!(err, UnknownBackend("anthropic".to_string()));
        assert_eq!(err.to_string(), "unknown backend: anthropic");
    }

    #[test]
    fn round_trips_through_as_str() {
        for backend in Backend::all() {
            assert_eq!(backend.as_str().parse::<Backend>(), Ok(backend));
        }
    }

    #[test]
    fn only_openai_is_hosted() {
        assert!(Backend::OpenAi.is_hosted());
        assert!(!Backend::Ollama.is_hosted());
    }

    #[test]
    fn default_models_come_from_the_catalog() {
        assert_eq!(Backend::OpenAi.default_model(), "gpt-4o");
        assert_eq!(Backend::Ollama.default_model(), "gemma:2b");
    }
}

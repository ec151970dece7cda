use clap::ValueEnum;
use shared::{Backend, BackendInfo, ChatSettings, ProfileResponse};

use crate::prompt::{PromptTemplate, FRIENDLY_INSTRUCTION, HELPFUL_INSTRUCTION};

/// Which flavour of the chat app is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AppProfile {
    /// OpenAI only, the user supplies an API key
    #[value(name = "openai")]
    OpenAi,
    /// Ollama only, no key needed
    Ollama,
    /// Both backends, selectable in the sidebar
    #[default]
    Combined,
}

impl AppProfile {
    pub fn title(&self) -> &'static str {
        match self {
            AppProfile::OpenAi => "Enhanced Q&A Chatbot with OpenAI",
            AppProfile::Ollama => "Enhanced Q&A Chatbot with Ollama",
            AppProfile::Combined => "Friendly Q&A Chatbot",
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            AppProfile::OpenAi | AppProfile::Ollama => "Go ahead and ask me any question:",
            AppProfile::Combined => "Ask me anything! (Responses will appear below)",
        }
    }

    pub fn backends(&self) -> &'static [Backend] {
        match self {
            AppProfile::OpenAi => &[Backend::OpenAi],
            AppProfile::Ollama => &[Backend::Ollama],
            AppProfile::Combined => &[Backend::OpenAi, Backend::Ollama],
        }
    }

    pub fn template(&self) -> PromptTemplate {
        match self {
            AppProfile::OpenAi | AppProfile::Ollama => PromptTemplate::new(HELPFUL_INSTRUCTION),
            AppProfile::Combined => PromptTemplate::new(FRIENDLY_INSTRUCTION),
        }
    }

    /// Default telemetry project when `ASKBOT_PROJECT` is unset.
    pub fn project(&self) -> &'static str {
        match self {
            AppProfile::OpenAi => "Simple Q&A Chatbot With OpenAI",
            AppProfile::Ollama => "Simple Q&A Chatbot With Ollama",
            AppProfile::Combined => "Friendly Q&A Chatbot",
        }
    }

    pub fn describe(&self) -> ProfileResponse {
        let backends = self.backends();
        ProfileResponse {
            title: self.title().to_string(),
            greeting: self.greeting().to_string(),
            backends: backends.iter().copied().map(BackendInfo::from).collect(),
            defaults: ChatSettings::for_backend(backends[0]),
        }
    }
}

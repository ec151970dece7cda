pub mod backend;
pub mod config;
pub mod error;
pub mod generator;
pub mod ollama;
mod openai;
pub mod profile;
pub mod prompt;

pub use backend::{
    BackendAdapter, ChatModel, Credential, GenerationRequest, ModelBuilder, ModelSettings,
    TokenLimit,
};
pub use config::{Endpoints, GeneratorConfig, TelemetryConfig};
pub use error::{ConfigurationError, GenerateError, GenerationError};
pub use generator::ResponseGenerator;
pub use ollama::OllamaClient;
pub use profile::AppProfile;
pub use prompt::{Message, Prompt, PromptTemplate, Role};
pub use shared::Backend;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

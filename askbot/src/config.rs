use std::env;
use std::str::FromStr;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub openai: String,
    pub ollama: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: OPENAI_BASE_URL.to_string(),
            ollama: OLLAMA_BASE_URL.to_string(),
        }
    }
}

/// Tags every generation span with a project name. Best effort: nothing
/// here can stop a request from being answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub project: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            project: None,
        }
    }
}

impl TelemetryConfig {
    pub fn project_name(&self) -> &str {
        self.project.as_deref().unwrap_or(env!("CARGO_PKG_NAME"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub endpoints: Endpoints,
    pub telemetry: TelemetryConfig,
}

impl GeneratorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            endpoints: Endpoints {
                openai: non_empty(lookup("OPENAI_BASE_URL")).unwrap_or(defaults.endpoints.openai),
                ollama: non_empty(lookup("OLLAMA_BASE_URL")).unwrap_or(defaults.endpoints.ollama),
            },
            telemetry: TelemetryConfig {
                enabled: parse_or(&lookup, "ASKBOT_TRACING", defaults.telemetry.enabled),
                project: non_empty(lookup("ASKBOT_PROJECT")),
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(val) => match val.trim().parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        None => default,
    }
}

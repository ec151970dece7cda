use reqwest::header::{HeaderValue, AUTHORIZATION};

use crate::backend::{Credential, ModelSettings};
use crate::error::ConfigurationError;
use crate::APP_USER_AGENT;

pub(crate) mod completion;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    base_url: String,
    api_key: Credential,
}

/// Chat client for the hosted OpenAI API, bound to one set of model settings.
pub(crate) struct Client {
    http: reqwest::Client,
    base_url: String,
    settings: ModelSettings,
}

impl Config {
    pub(crate) fn new(base_url: &str, api_key: Credential) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub(crate) fn client(&self, settings: ModelSettings) -> Result<Client, ConfigurationError> {
        let mut headers = reqwest::header::HeaderMap::new();

        let value = format!("Bearer {}", self.api_key.expose());
        let mut value = HeaderValue::from_str(&value).map_err(|_| {
            ConfigurationError::Client("credential is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);

        headers.insert(AUTHORIZATION, value);

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigurationError::Client(e.to_string()))?;

        Ok(Client {
            http,
            base_url: self.base_url.clone(),
            settings,
        })
    }
}

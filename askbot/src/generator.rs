use tracing::{Instrument, Span};

use crate::backend::{BackendAdapter, GenerationRequest, ModelBuilder};
use crate::config::{GeneratorConfig, TelemetryConfig};
use crate::error::GenerateError;
use crate::profile::AppProfile;
use crate::prompt::PromptTemplate;

/// Renders the prompt, builds the model client and returns the reply text.
pub struct ResponseGenerator<B = BackendAdapter> {
    builder: B,
    template: PromptTemplate,
    telemetry: TelemetryConfig,
}

impl ResponseGenerator<BackendAdapter> {
    pub fn new(config: &GeneratorConfig, profile: AppProfile) -> Self {
        let adapter =
            BackendAdapter::new(config.endpoints.clone()).with_backends(profile.backends());

        let mut telemetry = config.telemetry.clone();
        if telemetry.project.is_none() {
            telemetry.project = Some(profile.project().to_string());
        }

        Self::with_builder(adapter, profile.template(), telemetry)
    }
}

impl<B: ModelBuilder> ResponseGenerator<B> {
    pub fn with_builder(builder: B, template: PromptTemplate, telemetry: TelemetryConfig) -> Self {
        Self {
            builder,
            template,
            telemetry,
        }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.telemetry
    }

    /// One provider call, no retries. Configuration problems surface before
    /// anything is sent.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError> {
        let prompt = self.template.render(&request.question);
        let model = self.builder.build(request)?;

        let span = if self.telemetry.enabled {
            tracing::info_span!(
                "generate",
                project = %self.telemetry.project_name(),
                backend = %request.backend,
                model = %request.model,
            )
        } else {
            Span::none()
        };

        let answer = model.invoke(&prompt).instrument(span.clone()).await;
        span.in_scope(|| match &answer {
            Ok(text) => tracing::info!(answer_len = text.len(), "generation finished"),
            Err(e) => tracing::warn!(error = %e, "generation failed"),
        });

        Ok(answer?)
    }
}

//! Language-model client — the loop's single gateway to the provider.
//!
//! Owns the prompt rendering, the per-call timeout, and the strict parse
//! of the raw completion. The loop above it only ever sees a typed
//! [`NextStep`] or a [`StepError`].

use std::sync::Arc;
use std::time::Duration;

use reagent_core::error::ProviderError;
use reagent_core::provider::Provider;
use reagent_core::tool::ToolSpec;
use reagent_core::Transcript;
use thiserror::Error;
use tracing::debug;

use crate::parse::{parse_step, NextStep, ParseError};
use crate::prompt::build_request;

/// Why a single model call failed to produce a step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The provider responded but the text did not match the grammar.
    /// Recoverable: the loop retries up to its parse-retry budget.
    #[error(transparent)]
    Malformed(#[from] ParseError),

    /// The provider itself failed (transport, auth, rate limit, timeout).
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A configured connection to one model.
#[derive(Clone)]
pub struct StepClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl StepClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: Some(1024),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Deadline for a single completion call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for its next step given the transcript so far.
    pub async fn next_step(
        &self,
        transcript: &Transcript,
        specs: &[ToolSpec],
    ) -> Result<NextStep, StepError> {
        let request = build_request(
            &self.model,
            self.temperature,
            self.max_tokens,
            specs,
            transcript,
        );

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            steps = transcript.len(),
            "Requesting next step"
        );

        let completion = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "no completion within {}s",
                    self.timeout.as_secs()
                ))
            })??;

        debug!(chars = completion.text.len(), "Received completion");

        Ok(parse_step(&completion.text)?)
    }
}

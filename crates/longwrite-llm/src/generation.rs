//! The retrying generation client shared by the plan and write stages.

use std::sync::Arc;
use std::time::Duration;

use longwrite_config::Config;
use longwrite_utils::redaction::redact_error_message;
use tracing::{debug, warn};

use crate::LlmError;
use crate::chat_backend::ChatCompletionsBackend;
use crate::retry::RetryPolicy;
use crate::types::{LlmBackend, LlmInvocation, Message};

/// Legacy marker for a content-policy rejection
pub const CONTENT_FILTERED_SENTINEL: &str = "Trigger OpenAI's content management policy";
/// Legacy marker for exhausted retries
pub const EXHAUSTED_SENTINEL: &str = "Max tries. Failed.";

/// One generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub stop: Option<Vec<String>>,
}

impl GenerationRequest {
    /// Request with temperature 1.0 and no stop sequences
    #[must_use]
    pub fn new(prompt: impl Into<String>, max_new_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_new_tokens,
            temperature: 1.0,
            stop: None,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Outcome of a generation request that did not hit a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The service answered; may be empty
    Text(String),
    /// The service refused the prompt under its content policy
    ContentFiltered,
    /// Every attempt failed with a transient error
    Exhausted { attempts: u32 },
}

impl Generation {
    /// Text worth keeping: `Some` only for non-blank `Text`
    #[must_use]
    pub fn usable_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// The marker string the non-text outcomes are known by in logs
    #[must_use]
    pub fn sentinel(&self) -> Option<&'static str> {
        match self {
            Self::Text(_) => None,
            Self::ContentFiltered => Some(CONTENT_FILTERED_SENTINEL),
            Self::Exhausted { .. } => Some(EXHAUSTED_SENTINEL),
        }
    }

    /// Short reason for a non-usable outcome
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Text(text) if text.trim().is_empty() => "empty response",
            Self::Text(_) => "text",
            Self::ContentFiltered => "content filtered",
            Self::Exhausted { .. } => "retries exhausted",
        }
    }
}

/// Resilient wrapper around one [`LlmBackend`].
///
/// Each attempt is one backend call with the configured timeout. Context
/// length and misconfiguration errors are returned as `Err` without retrying; content-filter
/// rejections end the request as [`Generation::ContentFiltered`]; every
/// other error is logged and retried until the policy's attempt ceiling,
/// after which [`Generation::Exhausted`] is returned.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn LlmBackend>,
    model: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl GenerationClient {
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        model: impl Into<String>,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            timeout,
            policy,
        }
    }

    /// Client over the chat completions backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if endpoint, model, or key is missing.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let backend = ChatCompletionsBackend::new_from_config(config)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Client over an arbitrary backend, with model, timeout, and retry
    /// policy taken from `config`.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn LlmBackend>, config: &Config) -> Self {
        Self::new(
            backend,
            config.llm.model.clone().unwrap_or_default(),
            config.llm.timeout(),
            RetryPolicy::from(&config.retry),
        )
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one generation request under the retry policy.
    ///
    /// # Errors
    ///
    /// `LlmError::ContextLengthExceeded` and `LlmError::Misconfiguration`;
    /// retrying them cannot succeed.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, LlmError> {
        let invocation = LlmInvocation::new(
            self.model.clone(),
            self.timeout,
            vec![Message::user(request.prompt.clone())],
            request.max_new_tokens,
            request.temperature,
        )
        .with_stop(request.stop.clone());

        let max_attempts = self.policy.max_attempts.max(1);
        let provider = self.backend.provider_name().to_string();

        for attempt in 1..=max_attempts {
            match self.backend.invoke(invocation.clone()).await {
                Ok(result) => {
                    debug!(
                        provider = %provider,
                        attempt,
                        chars = result.raw_response.chars().count(),
                        "Generation succeeded"
                    );
                    return Ok(Generation::Text(result.raw_response));
                }
                Err(LlmError::ContentFiltered(msg)) => {
                    warn!(
                        provider = %provider,
                        attempt,
                        error = %redact_error_message(&msg),
                        "{CONTENT_FILTERED_SENTINEL}"
                    );
                    return Ok(Generation::ContentFiltered);
                }
                Err(err) if !err.is_retryable() => {
                    warn!(
                        provider = %provider,
                        attempt,
                        error = %redact_error_message(&err.to_string()),
                        "Generation failed, not retrying"
                    );
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        provider = %provider,
                        attempt,
                        max_attempts,
                        error = %redact_error_message(&err.to_string()),
                        "Generation attempt failed, retrying"
                    );
                    if attempt < max_attempts {
                        let delay = self.policy.backoff(attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        warn!(provider = %provider, attempts = max_attempts, "{EXHAUSTED_SENTINEL}");
        Ok(Generation::Exhausted {
            attempts: max_attempts,
        })
    }
}

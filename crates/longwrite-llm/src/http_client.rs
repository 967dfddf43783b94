//! Shared HTTP client for the chat completions backend
//!
//! One `reqwest::Client` is built per process and reused for every call.
//! Each call is a single attempt with its own timeout; retrying belongs to
//! [`GenerationClient`](crate::GenerationClient).

use longwrite_utils::redaction::redact_error_message;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::LlmError;

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies longer than this are truncated in error messages
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Provider wording for prompts that do not fit the model
pub(crate) const CONTEXT_LENGTH_MARKER: &str = "maximum context length";

/// Provider wording for content management policy rejections
pub(crate) const CONTENT_FILTER_MARKER: &str = "triggering";

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start a POST request on the shared client
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    /// Execute one request and return the body of a 200 response.
    ///
    /// Non-200 responses have their body read and classified with
    /// [`classify_error_body`].
    pub async fn execute(
        &self,
        request_builder: reqwest::RequestBuilder,
        timeout: Duration,
        provider_name: &str,
    ) -> Result<String, LlmError> {
        let request = request_builder
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build request: {e}")))?;

        debug!(
            provider = provider_name,
            timeout_secs = timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| map_transport_error(&e, timeout, provider_name))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(&e, timeout, provider_name))?;

        if status != StatusCode::OK {
            return Err(classify_error_body(status, &body, provider_name));
        }

        Ok(body)
    }
}

fn map_transport_error(e: &reqwest::Error, timeout: Duration, provider_name: &str) -> LlmError {
    if e.is_timeout() {
        return LlmError::Timeout { duration: timeout };
    }
    LlmError::Transport(format!(
        "{provider_name} request failed: {}",
        redact_error_message(&e.to_string())
    ))
}

/// Classify a non-200 response.
///
/// The body wins over the status: context-length and content-filter wording
/// is recognised whatever status carried it. Otherwise:
/// - 401/403 → `ProviderAuth`
/// - 429 → `ProviderQuota`
/// - 5xx → `ProviderOutage`
/// - anything else → `Transport`
pub(crate) fn classify_error_body(status: StatusCode, body: &str, provider_name: &str) -> LlmError {
    let detail = truncate(&redact_error_message(body));

    if body.contains(CONTEXT_LENGTH_MARKER) {
        return LlmError::ContextLengthExceeded(format!("{provider_name} {status}: {detail}"));
    }
    if body.contains(CONTENT_FILTER_MARKER) {
        return LlmError::ContentFiltered(format!("{provider_name} {status}: {detail}"));
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{provider_name} authentication failed: {status}"
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        s if s.is_server_error() => {
            LlmError::ProviderOutage(format!("{provider_name} returned server error: {status}"))
        }
        _ => LlmError::Transport(format!(
            "{provider_name} returned {status}: {detail}"
        )),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}

//! Core types for LLM backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::LlmError;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Input to one backend call
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Model identifier; empty means the backend default
    pub model: String,
    /// Bounded wait for this call
    pub timeout: Duration,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Option<Vec<String>>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.into(),
            timeout,
            messages,
            max_tokens,
            temperature,
            stop: None,
        }
    }

    #[must_use]
    pub fn with_stop(mut self, stop: Option<Vec<String>>) -> Self {
        self.stop = stop;
        self
    }
}

/// Result of one successful backend call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResult {
    /// First completion's text; empty when the response had none
    pub raw_response: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }
}

/// Trait for LLM backend implementations
///
/// One call is one attempt. Retrying is the generation client's job.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the backend once.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` classified so the caller can decide whether to
    /// retry: context-length and content-filter errors are terminal, the
    /// rest are transient.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;

    /// Short provider name for logs
    fn provider_name(&self) -> &str;
}

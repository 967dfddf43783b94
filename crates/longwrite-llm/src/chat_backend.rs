//! OpenAI-compatible chat completions backend
//!
//! Posts `{model, messages, temperature, max_tokens, stop?}` with bearer auth
//! to the configured endpoint and returns the first choice's content.

use async_trait::async_trait;
use longwrite_config::Config;
use serde::Serialize;
use tracing::debug;

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const PROVIDER: &str = "chat-completions";

/// Backend for any endpoint speaking the chat completions protocol
#[derive(Clone)]
pub struct ChatCompletionsBackend {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    default_model: String,
}

impl std::fmt::Debug for ChatCompletionsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsBackend")
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            default_model: default_model.into(),
        })
    }

    /// Build the backend from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if endpoint, model, or key is missing.
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let endpoint = config.llm.endpoint.clone().ok_or_else(|| {
            LlmError::Misconfiguration("END_POINT is not configured".to_string())
        })?;
        let model = config
            .llm
            .model
            .clone()
            .ok_or_else(|| LlmError::Misconfiguration("GPT_MODEL is not configured".to_string()))?;
        let api_key = config.llm.api_key.clone().ok_or_else(|| {
            LlmError::Misconfiguration(format!(
                "API key not found in '{}'",
                config.llm.api_key_env
            ))
        })?;

        Self::new(endpoint, api_key, model)
    }

    fn resolve_model(&self, inv: &LlmInvocation) -> String {
        if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        }
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &msg.content,
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for ChatCompletionsBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = self.resolve_model(&inv);

        debug!(
            provider = PROVIDER,
            model = %model,
            max_tokens = inv.max_tokens,
            temperature = inv.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking chat completions backend"
        );

        let request_body = ChatRequest {
            model: &model,
            messages: Self::convert_messages(&inv.messages),
            temperature: inv.temperature,
            max_tokens: inv.max_tokens,
            stop: inv.stop.as_deref(),
        };

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let body = self.client.execute(request, inv.timeout, PROVIDER).await?;
        let result = parse_response(&body, &model)?;

        debug!(
            provider = PROVIDER,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            chars = result.raw_response.chars().count(),
            "Chat completions invocation completed"
        );

        Ok(result)
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}

/// Parse a 200 body.
///
/// Unparseable JSON is a transport error (retried). A parseable body without
/// `choices[0].message.content` yields empty text.
pub(crate) fn parse_response(body: &str, model: &str) -> Result<LlmResult, LlmError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| LlmError::Transport(format!("Failed to parse {PROVIDER} response: {e}")))?;

    let content = value
        .pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();

    let model_used = value
        .get("model")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(model);

    let mut result = LlmResult::new(content, PROVIDER, model_used);
    if let (Some(input), Some(output)) = (
        value.pointer("/usage/prompt_tokens").and_then(serde_json::Value::as_u64),
        value
            .pointer("/usage/completion_tokens")
            .and_then(serde_json::Value::as_u64),
    ) {
        result = result.with_tokens(input, output);
    }
    Ok(result)
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn backend() -> ChatCompletionsBackend {
        ChatCompletionsBackend::new("http://127.0.0.1:9/v1/chat/completions", "key", "m-default")
            .unwrap()
    }

    #[test]
    fn test_resolve_model_prefers_invocation() {
        let b = backend();
        let inv = LlmInvocation::new("", Duration::from_secs(1), vec![], 10, 1.0);
        assert_eq!(b.resolve_model(&inv), "m-default");
        let inv = LlmInvocation::new("m-other", Duration::from_secs(1), vec![], 10, 1.0);
        assert_eq!(b.resolve_model(&inv), "m-other");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Message::user("hello")];
        let stop = vec!["END".to_string()];
        let body = ChatRequest {
            model: "m",
            messages: ChatCompletionsBackend::convert_messages(&messages),
            temperature: 1.0,
            max_tokens: 4096,
            stop: Some(&stop),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["stop"][0], "END");

        let no_stop = ChatRequest { stop: None, ..body };
        let json = serde_json::to_value(&no_stop).unwrap();
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_parse_response_content_and_usage() {
        let body = r#"{"model":"gpt-x","choices":[{"message":{"role":"assistant","content":"Step 1"}}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#;
        let result = parse_response(body, "m").unwrap();
        assert_eq!(result.raw_response, "Step 1");
        assert_eq!(result.model_used, "gpt-x");
        assert_eq!(result.tokens_input, Some(12));
        assert_eq!(result.tokens_output, Some(3));
    }

    #[test]
    fn test_parse_response_unexpected_shape_is_empty() {
        let result = parse_response(r#"{"choices":[]}"#, "m").unwrap();
        assert_eq!(result.raw_response, "");
        let result =
            parse_response(r#"{"choices":[{"message":{"content":null}}]}"#, "m").unwrap();
        assert_eq!(result.raw_response, "");
    }

    #[test]
    fn test_parse_response_invalid_json_is_transport() {
        assert!(matches!(
            parse_response("<html>gateway</html>", "m"),
            Err(LlmError::Transport(_))
        ));
    }

    #[test]
    fn test_new_from_config_requires_key() {
        let mut config = Config::minimal_for_testing();
        assert!(ChatCompletionsBackend::new_from_config(&config).is_ok());
        config.llm.api_key = None;
        assert!(matches!(
            ChatCompletionsBackend::new_from_config(&config),
            Err(LlmError::Misconfiguration(_))
        ));
    }
}

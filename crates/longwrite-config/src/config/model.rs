use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use longwrite_utils::types::ConfigSource;

/// Env key holding the API key unless `llm.api_key_env` says otherwise
pub const DEFAULT_API_KEY_ENV: &str = "GPT4_API_KEY";
/// Env key holding the model name
pub const MODEL_ENV: &str = "GPT_MODEL";
/// Env key holding the chat completions endpoint URL
pub const ENDPOINT_ENV: &str = "END_POINT";
/// Env key overriding the worker count
pub const WORKERS_ENV: &str = "LONGWRITE_WORKERS";
/// Env key overriding the output token budget
pub const MAX_NEW_TOKENS_ENV: &str = "LONGWRITE_MAX_NEW_TOKENS";
/// Env key overriding the plan step ceiling
pub const MAX_STEPS_ENV: &str = "LONGWRITE_MAX_STEPS";

/// Default per-request timeout for the generation service
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
/// Default number of concurrent stage workers
pub const DEFAULT_WORKERS: usize = 8;
/// Default output token budget per generation call
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 4096;
/// Plans with more steps than this are dropped as malformed
pub const DEFAULT_MAX_STEPS: usize = 50;
/// Default attempt ceiling for one generation request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default first backoff delay
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;
/// Default backoff cap
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default extractor command for PDF files
pub const DEFAULT_PDF_COMMAND: &str = "pdftotext";
/// Default extractor timeout
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 120;

/// Configuration for longwrite operations.
///
/// Built once at startup by [`Config::discover()`] (or the builder) and passed
/// by reference into the generation client and stage runners. Nothing here is
/// read from or written to process-global state after construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub retry: RetryConfig,
    pub extraction: ExtractionConfig,
    /// Where each effective value came from
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Generation service settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat completions endpoint URL
    pub endpoint: Option<String>,
    /// Model identifier sent with every request
    pub model: Option<String>,
    /// Bearer credential; never serialized or printed
    pub api_key: Option<String>,
    /// Env key the credential is read from
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Stage settings shared by plan and write runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub workers: usize,
    pub max_new_tokens: u32,
    pub max_steps: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Retry policy for one generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// 0 disables backoff entirely
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

/// External extractor commands. `{input}` in an argument is replaced by the
/// document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub pdf_command: Option<String>,
    pub pdf_args: Vec<String>,
    pub pptx_command: Option<String>,
    pub pptx_args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdf_command: Some(DEFAULT_PDF_COMMAND.to_string()),
            pdf_args: vec!["{input}".to_string(), "-".to_string()],
            pptx_command: None,
            pptx_args: vec!["{input}".to_string()],
            timeout_secs: DEFAULT_EXTRACTION_TIMEOUT_SECS,
        }
    }
}

/// `longwrite.toml` file structure; every field optional
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub llm: Option<TomlLlm>,
    pub pipeline: Option<TomlPipeline>,
    pub retry: Option<TomlRetry>,
    pub extraction: Option<TomlExtraction>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlLlm {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlPipeline {
    pub workers: Option<usize>,
    pub max_new_tokens: Option<u32>,
    pub max_steps: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlRetry {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlExtraction {
    pub pdf_command: Option<String>,
    pub pdf_args: Option<Vec<String>>,
    pub pptx_command: Option<String>,
    pub pptx_args: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

mod builder;
mod cli_args;
mod discovery;
mod env_file;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::CONFIG_FILE_NAME;
pub use env_file::{DEFAULT_ENV_FILE, EnvFile};
pub use longwrite_utils::types::ConfigSource;
pub use model::{
    Config, DEFAULT_API_KEY_ENV, DEFAULT_BASE_DELAY_MS, DEFAULT_EXTRACTION_TIMEOUT_SECS,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_NEW_TOKENS, DEFAULT_MAX_STEPS,
    DEFAULT_PDF_COMMAND, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS, ENDPOINT_ENV,
    ExtractionConfig, LlmConfig, MAX_NEW_TOKENS_ENV, MAX_STEPS_ENV, MODEL_ENV, PipelineConfig,
    RetryConfig, WORKERS_ENV,
};

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Configuration for unit tests: defaults plus a dummy endpoint, model,
    /// and key, with backoff disabled.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Config {
            llm: LlmConfig {
                endpoint: Some("http://127.0.0.1:9/v1/chat/completions".to_string()),
                model: Some("test-model".to_string()),
                api_key: Some("test-key".to_string()),
                ..LlmConfig::default()
            },
            pipeline: PipelineConfig::default(),
            retry: RetryConfig {
                base_delay_ms: 0,
                ..RetryConfig::default()
            },
            extraction: ExtractionConfig::default(),
            source_attribution: std::collections::HashMap::new(),
        }
    }
}

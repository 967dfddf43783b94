use std::collections::HashMap;

use longwrite_utils::error::ConfigError;

use super::{
    Config, ConfigSource, ExtractionConfig, LlmConfig, PipelineConfig, RetryConfig,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use longwrite_config::Config;
    ///
    /// let config = Config::builder()
    ///     .endpoint("https://api.example.com/v1/chat/completions")
    ///     .model("gpt-4o")
    ///     .api_key("sk-...")
    ///     .workers(4)
    ///     .build()
    ///     .expect("Failed to build config");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// Values set through the builder are attributed to
/// `ConfigSource::Programmatic`; everything else keeps its default.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    endpoint: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    workers: Option<usize>,
    max_new_tokens: Option<u32>,
    max_steps: Option<usize>,
    retry: Option<RetryConfig>,
    extraction: Option<ExtractionConfig>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    #[must_use]
    pub fn max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = Some(max_new_tokens);
        self
    }

    #[must_use]
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Replace the whole retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    #[must_use]
    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = Some(extraction);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut mark = |key: &str, is_set: bool| {
            let source = if is_set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };

        mark("llm.endpoint", self.endpoint.is_some());
        mark("llm.model", self.model.is_some());
        mark("llm.api_key", self.api_key.is_some());
        mark("llm.temperature", self.temperature.is_some());
        mark("llm.timeout_secs", self.timeout_secs.is_some());
        mark("pipeline.workers", self.workers.is_some());
        mark("pipeline.max_new_tokens", self.max_new_tokens.is_some());
        mark("pipeline.max_steps", self.max_steps.is_some());
        mark("retry.max_attempts", self.retry.is_some());
        mark("retry.base_delay_ms", self.retry.is_some());
        mark("retry.max_delay_ms", self.retry.is_some());
        mark("extraction.pdf_command", self.extraction.is_some());
        mark("extraction.timeout_secs", self.extraction.is_some());

        let defaults = LlmConfig::default();
        let llm = LlmConfig {
            endpoint: self.endpoint,
            model: self.model,
            api_key: self.api_key,
            temperature: self.temperature.unwrap_or(defaults.temperature),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            ..defaults
        };

        let pipeline_defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            workers: self.workers.unwrap_or(pipeline_defaults.workers),
            max_new_tokens: self
                .max_new_tokens
                .unwrap_or(pipeline_defaults.max_new_tokens),
            max_steps: self.max_steps.unwrap_or(pipeline_defaults.max_steps),
        };

        let config = Config {
            llm,
            pipeline,
            retry: self.retry.unwrap_or_default(),
            extraction: self.extraction.unwrap_or_default(),
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(
            config.source_attribution.get("pipeline.workers"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_builder_values_are_programmatic() {
        let config = Config::builder()
            .model("m")
            .workers(3)
            .max_steps(10)
            .build()
            .unwrap();

        assert_eq!(config.llm.model.as_deref(), Some("m"));
        assert_eq!(config.pipeline.workers, 3);
        assert_eq!(config.pipeline.max_steps, 10);
        assert_eq!(
            config.source_attribution.get("pipeline.workers"),
            Some(&ConfigSource::Programmatic)
        );
    }

    #[test]
    fn test_builder_validates() {
        assert!(Config::builder().workers(0).build().is_err());
    }
}

use longwrite_utils::error::ConfigError;

use super::Config;

const MAX_WORKERS: usize = 256;
const MAX_ATTEMPTS: u32 = 100;
const MAX_TIMEOUT_SECS: u64 = 7200;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate ranges of all numeric settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.workers == 0 {
            return Err(invalid("pipeline.workers", "must be greater than 0"));
        }
        if self.pipeline.workers > MAX_WORKERS {
            return Err(invalid(
                "pipeline.workers",
                format!("exceeds maximum limit of {MAX_WORKERS}"),
            ));
        }
        if self.pipeline.max_new_tokens == 0 {
            return Err(invalid("pipeline.max_new_tokens", "must be greater than 0"));
        }
        if self.pipeline.max_steps == 0 {
            return Err(invalid("pipeline.max_steps", "must be greater than 0"));
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be greater than 0"));
        }
        if self.retry.max_attempts > MAX_ATTEMPTS {
            return Err(invalid(
                "retry.max_attempts",
                format!("exceeds maximum limit of {MAX_ATTEMPTS}"),
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(invalid(
                "retry.max_delay_ms",
                "must be at least retry.base_delay_ms",
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be greater than 0"));
        }
        if self.llm.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "llm.timeout_secs",
                format!("exceeds maximum limit of {MAX_TIMEOUT_SECS} seconds"),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return Err(invalid("llm.api_key_env", "must not be empty"));
        }

        if self.extraction.timeout_secs == 0 {
            return Err(invalid("extraction.timeout_secs", "must be greater than 0"));
        }

        Ok(())
    }

    /// Check that everything a remote generation call needs is present.
    ///
    /// Only the `plan` and `write` commands call this; extraction and record
    /// building run without service credentials.
    pub fn validate_for_generation(&self) -> Result<(), ConfigError> {
        let endpoint = self
            .llm
            .endpoint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("END_POINT (llm.endpoint)".to_string()))?;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(invalid("llm.endpoint", "must be an http(s) URL"));
        }

        if self
            .llm
            .model
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(ConfigError::MissingRequired("GPT_MODEL (llm.model)".to_string()));
        }

        if self
            .llm
            .api_key
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(ConfigError::MissingRequired(format!(
                "{} (llm.api_key)",
                self.llm.api_key_env
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config::builder()
            .endpoint("https://api.example.com/v1/chat/completions")
            .model("m")
            .api_key("sk-test")
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let config = base();
        assert!(config.validate().is_ok());
        assert!(config.validate_for_generation().is_ok());
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = base();
        config.pipeline.workers = 0;
        assert!(config.validate().is_err());
        config.pipeline.workers = 257;
        assert!(config.validate().is_err());
        config.pipeline.workers = 256;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_attempt_bounds() {
        let mut config = base();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
        config.retry.max_attempts = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delay_cap_below_base_is_rejected() {
        let mut config = base();
        config.retry.base_delay_ms = 1_000;
        config.retry.max_delay_ms = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "retry.max_delay_ms"
        ));
    }

    #[test]
    fn test_generation_requires_endpoint_model_key() {
        let mut config = base();
        config.llm.api_key = None;
        assert!(matches!(
            config.validate_for_generation(),
            Err(ConfigError::MissingRequired(msg)) if msg.contains("GPT4_API_KEY")
        ));

        let mut config = base();
        config.llm.model = Some("  ".to_string());
        assert!(config.validate_for_generation().is_err());

        let mut config = base();
        config.llm.endpoint = Some("ftp://nope".to_string());
        assert!(matches!(
            config.validate_for_generation(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

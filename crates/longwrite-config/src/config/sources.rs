use std::collections::BTreeMap;

use longwrite_utils::redaction::mask_secret;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)`, sorted by key.
    ///
    /// The API key is masked; unset optional values are omitted.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(key));
                config.insert(key.to_string(), (val, source));
            }
        };

        add("llm.endpoint", self.llm.endpoint.clone());
        add("llm.model", self.llm.model.clone());
        add(
            "llm.api_key",
            Some(mask_secret(self.llm.api_key.as_deref().unwrap_or_default())),
        );
        add("llm.api_key_env", Some(self.llm.api_key_env.clone()));
        add("llm.timeout_secs", Some(self.llm.timeout_secs.to_string()));
        add("llm.temperature", Some(self.llm.temperature.to_string()));

        add("pipeline.workers", Some(self.pipeline.workers.to_string()));
        add(
            "pipeline.max_new_tokens",
            Some(self.pipeline.max_new_tokens.to_string()),
        );
        add("pipeline.max_steps", Some(self.pipeline.max_steps.to_string()));

        add("retry.max_attempts", Some(self.retry.max_attempts.to_string()));
        add(
            "retry.base_delay_ms",
            Some(self.retry.base_delay_ms.to_string()),
        );
        add("retry.max_delay_ms", Some(self.retry.max_delay_ms.to_string()));

        add("extraction.pdf_command", self.extraction.pdf_command.clone());
        add(
            "extraction.pptx_command",
            self.extraction.pptx_command.clone(),
        );
        add(
            "extraction.timeout_secs",
            Some(self.extraction.timeout_secs.to_string()),
        );

        config
    }
}

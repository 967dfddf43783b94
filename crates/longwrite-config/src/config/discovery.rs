use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use longwrite_utils::error::ConfigError;

use super::env_file::{DEFAULT_ENV_FILE, EnvFile};
use super::model::{
    ENDPOINT_ENV, MAX_NEW_TOKENS_ENV, MAX_STEPS_ENV, MODEL_ENV, TomlConfig, WORKERS_ENV,
};
use super::{
    CliArgs, Config, ConfigSource, ExtractionConfig, LlmConfig, PipelineConfig, RetryConfig,
};

/// Config file name searched for by discovery
pub const CONFIG_FILE_NAME: &str = "longwrite.toml";

const DEFAULT_KEYS: &[&str] = &[
    "llm.api_key_env",
    "llm.timeout_secs",
    "llm.temperature",
    "pipeline.workers",
    "pipeline.max_new_tokens",
    "pipeline.max_steps",
    "retry.max_attempts",
    "retry.base_delay_ms",
    "retry.max_delay_ms",
    "extraction.pdf_command",
    "extraction.timeout_secs",
];

impl Config {
    /// Discover and load configuration with precedence:
    /// CLI > process environment > env file > config file > defaults
    ///
    /// Uses the current working directory for file discovery and the real
    /// process environment.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            ConfigError::DiscoveryFailed(format!("Failed to get current directory: {e}"))
        })?;
        let process_env: HashMap<String, String> = std::env::vars().collect();
        Self::discover_from(&start_dir, cli_args, &process_env)
    }

    /// Discover and load configuration starting from a specific directory
    /// with an explicit environment map.
    ///
    /// This is the path-driven variant used by tests to avoid process-global
    /// state.
    pub fn discover_from(
        start_dir: &Path,
        cli_args: &CliArgs,
        process_env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config {
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
            retry: RetryConfig::default(),
            extraction: ExtractionConfig::default(),
            source_attribution: HashMap::new(),
        };
        for key in DEFAULT_KEYS {
            config
                .source_attribution
                .insert((*key).to_string(), ConfigSource::Default);
        }

        // Config file
        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::InvalidFile(format!(
                        "Config file not found: {}",
                        explicit.display()
                    )));
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };
        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)?;
            config.apply_toml(file_config, &ConfigSource::ConfigFile(path.clone()));
            tracing::debug!(path = %path.display(), "Loaded config file");
        }

        // Env file
        let env_file = match &cli_args.env_file {
            Some(explicit) => match EnvFile::load(explicit)? {
                Some(env) => Some(env),
                None => {
                    return Err(ConfigError::InvalidFile(format!(
                        "Env file not found: {}",
                        explicit.display()
                    )));
                }
            },
            None => {
                let default_path = start_dir.join(DEFAULT_ENV_FILE);
                let loaded = EnvFile::load(&default_path)?;
                if loaded.is_none() {
                    tracing::warn!(
                        path = %default_path.display(),
                        "Env file not found; relying on process environment"
                    );
                }
                loaded
            }
        };
        if let Some(env) = &env_file {
            let source = ConfigSource::EnvFile(env.path.clone());
            config.apply_env(|key| env.get(key), &source)?;
        }

        // Process environment
        config.apply_env(
            |key| process_env.get(key).map(String::as_str),
            &ConfigSource::Environment,
        )?;

        // CLI flags
        config.apply_cli(cli_args);

        config.validate()?;
        Ok(config)
    }

    /// Search upward from `start_dir` for `longwrite.toml`.
    ///
    /// Stops at a repository root (`.git`, `.hg`, `.svn`) or the filesystem
    /// root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                return None;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => return None,
            }
        }
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile(format!(
                "Failed to parse TOML config file {}: {e}",
                path.display()
            ))
        })
    }

    fn apply_toml(&mut self, file: TomlConfig, source: &ConfigSource) {
        let mut set = |key: &str| {
            self.source_attribution
                .insert(key.to_string(), source.clone());
        };

        if let Some(llm) = file.llm {
            if let Some(v) = llm.endpoint {
                self.llm.endpoint = Some(v);
                set("llm.endpoint");
            }
            if let Some(v) = llm.model {
                self.llm.model = Some(v);
                set("llm.model");
            }
            if let Some(v) = llm.api_key_env {
                self.llm.api_key_env = v;
                set("llm.api_key_env");
            }
            if let Some(v) = llm.timeout_secs {
                self.llm.timeout_secs = v;
                set("llm.timeout_secs");
            }
            if let Some(v) = llm.temperature {
                self.llm.temperature = v;
                set("llm.temperature");
            }
        }

        if let Some(pipeline) = file.pipeline {
            if let Some(v) = pipeline.workers {
                self.pipeline.workers = v;
                set("pipeline.workers");
            }
            if let Some(v) = pipeline.max_new_tokens {
                self.pipeline.max_new_tokens = v;
                set("pipeline.max_new_tokens");
            }
            if let Some(v) = pipeline.max_steps {
                self.pipeline.max_steps = v;
                set("pipeline.max_steps");
            }
        }

        if let Some(retry) = file.retry {
            if let Some(v) = retry.max_attempts {
                self.retry.max_attempts = v;
                set("retry.max_attempts");
            }
            if let Some(v) = retry.base_delay_ms {
                self.retry.base_delay_ms = v;
                set("retry.base_delay_ms");
            }
            if let Some(v) = retry.max_delay_ms {
                self.retry.max_delay_ms = v;
                set("retry.max_delay_ms");
            }
        }

        if let Some(extraction) = file.extraction {
            if let Some(v) = extraction.pdf_command {
                self.extraction.pdf_command = Some(v);
                set("extraction.pdf_command");
            }
            if let Some(v) = extraction.pdf_args {
                self.extraction.pdf_args = v;
            }
            if let Some(v) = extraction.pptx_command {
                self.extraction.pptx_command = Some(v);
                set("extraction.pptx_command");
            }
            if let Some(v) = extraction.pptx_args {
                self.extraction.pptx_args = v;
            }
            if let Some(v) = extraction.timeout_secs {
                self.extraction.timeout_secs = v;
                set("extraction.timeout_secs");
            }
        }
    }

    /// Apply one key=value layer (env file or process environment).
    fn apply_env<'a>(
        &mut self,
        lookup: impl Fn(&str) -> Option<&'a str>,
        source: &ConfigSource,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup(&self.llm.api_key_env).filter(|v| !v.is_empty()) {
            self.llm.api_key = Some(v.to_string());
            self.source_attribution
                .insert("llm.api_key".to_string(), source.clone());
        }
        if let Some(v) = lookup(MODEL_ENV).filter(|v| !v.is_empty()) {
            self.llm.model = Some(v.to_string());
            self.source_attribution
                .insert("llm.model".to_string(), source.clone());
        }
        if let Some(v) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.llm.endpoint = Some(v.to_string());
            self.source_attribution
                .insert("llm.endpoint".to_string(), source.clone());
        }
        if let Some(v) = lookup(WORKERS_ENV) {
            self.pipeline.workers = parse_env_value(WORKERS_ENV, v)?;
            self.source_attribution
                .insert("pipeline.workers".to_string(), source.clone());
        }
        if let Some(v) = lookup(MAX_NEW_TOKENS_ENV) {
            self.pipeline.max_new_tokens = parse_env_value(MAX_NEW_TOKENS_ENV, v)?;
            self.source_attribution
                .insert("pipeline.max_new_tokens".to_string(), source.clone());
        }
        if let Some(v) = lookup(MAX_STEPS_ENV) {
            self.pipeline.max_steps = parse_env_value(MAX_STEPS_ENV, v)?;
            self.source_attribution
                .insert("pipeline.max_steps".to_string(), source.clone());
        }
        Ok(())
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        let source = ConfigSource::Cli;
        let mut set = |key: &str| {
            self.source_attribution
                .insert(key.to_string(), source.clone());
        };

        if let Some(v) = &cli.endpoint {
            self.llm.endpoint = Some(v.clone());
            set("llm.endpoint");
        }
        if let Some(v) = &cli.model {
            self.llm.model = Some(v.clone());
            set("llm.model");
        }
        if let Some(v) = cli.temperature {
            self.llm.temperature = v;
            set("llm.temperature");
        }
        if let Some(v) = cli.timeout_secs {
            self.llm.timeout_secs = v;
            set("llm.timeout_secs");
        }
        if let Some(v) = cli.workers {
            self.pipeline.workers = v;
            set("pipeline.workers");
        }
        if let Some(v) = cli.max_new_tokens {
            self.pipeline.max_new_tokens = v;
            set("pipeline.max_new_tokens");
        }
        if let Some(v) = cli.max_steps {
            self.pipeline.max_steps = v;
            set("pipeline.max_steps");
        }
        if let Some(v) = cli.max_attempts {
            self.retry.max_attempts = v;
            set("retry.max_attempts");
        }
        if let Some(v) = cli.base_delay_ms {
            self.retry.base_delay_ms = v;
            set("retry.base_delay_ms");
        }
    }
}

fn parse_env_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: format!("'{raw}' is not a valid number"),
    })
}

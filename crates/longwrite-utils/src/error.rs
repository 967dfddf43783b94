use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type for longwrite operations.
///
/// `LongwriteError` is what library entry points (stage runners, extraction,
/// record building) return. It wraps the per-concern error enums below and
/// maps onto CLI exit codes via [`to_exit_code()`](Self::to_exit_code).
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file, env file, or CLI argument errors |
/// | `Llm` | Remote generation failures that escaped the retry loop |
/// | `Store` | JSONL store I/O, run lock contention |
/// | `Template` | Prompt template loading or validation |
/// | `Extraction` | Source document extraction and record building |
///
/// Library code returns `LongwriteError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum LongwriteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;
}

impl UserFriendlyError for LongwriteError {
    fn user_message(&self) -> String {
        match self {
            Self::Llm(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(ConfigError::MissingRequired(key)) => vec![
                format!("Set '{key}' in the env file (default: ./env) or in longwrite.toml."),
                "Run 'longwrite config' to see where each value comes from.".to_string(),
            ],
            Self::Config(ConfigError::EnvFileSyntax { .. }) => vec![
                "Env file lines must look like KEY = value; comments start with '#'.".to_string(),
            ],
            Self::Config(_) => {
                vec!["Run 'longwrite config' to inspect the effective configuration.".to_string()]
            }
            Self::Store(StoreError::LockHeld { path }) => vec![
                format!(
                    "Another longwrite run is writing to {}. Wait for it to finish.",
                    path.display()
                ),
                "If no other run is active, the lock is released automatically; retry.".to_string(),
            ],
            Self::Store(_) | Self::Io(_) => {
                vec!["Check that the input/output paths exist and are writable.".to_string()]
            }
            Self::Template(TemplateError::MissingPlaceholder { placeholder, .. }) => vec![format!(
                "Add the {placeholder} placeholder to the template file."
            )],
            Self::Template(_) => vec!["Check the --template path.".to_string()],
            Self::Extraction(ExtractionError::CommandNotFound { command }) => vec![format!(
                "Install '{command}' or configure a different extractor in [extraction]."
            )],
            Self::Extraction(_) => Vec::new(),
            Self::Llm(err) => err.suggestions(),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid env file {path}:{line}: {reason}")]
    EnvFileSyntax {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Configuration discovery failed: {0}")]
    DiscoveryFailed(String),
}

/// LLM backend errors.
///
/// The generation client sorts these into three outcomes. Content-filter
/// rejections end the request without retrying, other non-retryable errors
/// propagate, and everything else is retried.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, unreadable body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Prompt plus requested output exceeds the model context window
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Provider refused the prompt under its content policy
    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl LlmError {
    /// Whether retrying the same request can ever succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::ContextLengthExceeded(_) | Self::ContentFiltered(_) | Self::Misconfiguration(_)
        )
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::ContextLengthExceeded(msg) => {
                format!("Prompt does not fit the model context window: {msg}")
            }
            Self::ContentFiltered(msg) => format!("Prompt rejected by content policy: {msg}"),
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProviderAuth(_) => vec![
                "Check GPT4_API_KEY (or the configured api_key_env) in the env file.".to_string(),
            ],
            Self::ProviderQuota(_) => {
                vec!["Lower the worker count or raise retry.base_delay_ms.".to_string()]
            }
            Self::ContextLengthExceeded(_) => vec![
                "Lower pipeline.max_new_tokens or shorten the instruction/plan.".to_string(),
            ],
            Self::Timeout { .. } => vec!["Raise llm.timeout_secs.".to_string()],
            Self::Misconfiguration(_) => vec!["Check END_POINT and GPT_MODEL.".to_string()],
            _ => Vec::new(),
        }
    }
}

/// JSONL store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Another run holds the lock for {path}")]
    LockHeld { path: PathBuf },

    #[error("Writer for {path} has shut down")]
    WriterClosed { path: PathBuf },
}

/// Prompt template errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template '{name}' is missing placeholder {placeholder}")]
    MissingPlaceholder { name: String, placeholder: String },
}

/// Text extraction and record building errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported document type: {0}")]
    Unsupported(String),

    #[error("Extractor command '{command}' not found on PATH")]
    CommandNotFound { command: String },

    #[error("Extractor command '{command}' failed with status {status:?}: {stderr}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Extractor command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("No text in {0}")]
    EmptyText(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability_classification() {
        assert!(LlmError::Transport("reset".into()).is_retryable());
        assert!(LlmError::ProviderQuota("429".into()).is_retryable());
        assert!(LlmError::ProviderOutage("502".into()).is_retryable());
        assert!(
            LlmError::Timeout {
                duration: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(!LlmError::ContextLengthExceeded("too long".into()).is_retryable());
        assert!(!LlmError::ContentFiltered("policy".into()).is_retryable());
        assert!(!LlmError::Misconfiguration("bad header".into()).is_retryable());
    }

    #[test]
    fn test_lock_held_suggestions_mention_path() {
        let err = LongwriteError::Store(StoreError::LockHeld {
            path: PathBuf::from("write.jsonl.lock"),
        });
        let suggestions = err.suggestions();
        assert!(suggestions.iter().any(|s| s.contains("write.jsonl.lock")));
    }

    #[test]
    fn test_llm_user_message_passthrough() {
        let err = LongwriteError::Llm(LlmError::ContextLengthExceeded(
            "maximum context length is 8192 tokens".into(),
        ));
        assert!(err.user_message().contains("context window"));
    }
}

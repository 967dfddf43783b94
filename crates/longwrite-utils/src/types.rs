use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Source of a configuration value.
///
/// Indicates where a configuration value originated from in the precedence chain:
/// CLI arguments > process environment > env file > config file > built-in defaults.
/// Values set through `Config::builder()` are `Programmatic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Command-line flag
    Cli,
    /// Process environment variable
    Environment,
    /// Key=value env file
    EnvFile(PathBuf),
    /// TOML configuration file
    ConfigFile(PathBuf),
    /// Set through the builder API
    Programmatic,
    /// Built-in default
    Default,
}

impl ConfigSource {
    /// Stable short label for display
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Environment => "environment",
            Self::EnvFile(_) => "env_file",
            Self::ConfigFile(_) => "config_file",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvFile(path) | Self::ConfigFile(path) => {
                write!(f, "{} ({})", self.label(), path.display())
            }
            other => write!(f, "{}", other.label()),
        }
    }
}

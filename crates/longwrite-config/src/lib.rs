//! Configuration management for longwrite
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > process environment > env file > `longwrite.toml` > defaults.

mod config;

pub use config::*;
pub use longwrite_utils::error::ConfigError;

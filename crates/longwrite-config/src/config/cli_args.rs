use std::path::PathBuf;

/// CLI arguments that override configuration.
///
/// Populated by the binary from its flags; every field is optional so that an
/// unset flag falls through to the next source in the precedence chain.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub workers: Option<usize>,
    pub max_new_tokens: Option<u32>,
    pub max_steps: Option<usize>,
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
}

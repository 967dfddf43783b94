//! External extractor commands, run argv-style with no shell.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use longwrite_utils::error::ExtractionError;
use longwrite_utils::redaction::redact_error_message;

use crate::extractor::TextExtractor;

/// Argument token replaced by the document path
pub const INPUT_TOKEN: &str = "{input}";

/// Longest stderr excerpt kept in an error
const STDERR_EXCERPT: usize = 500;

/// Runs `program args...` and takes its stdout as the document text
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Arguments with `{input}` replaced by `input`.
    ///
    /// An argument that is exactly `{input}` becomes the path unchanged, so
    /// non-UTF-8 paths survive.
    #[must_use]
    pub fn build_args(&self, input: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if arg == INPUT_TOKEN {
                    input.as_os_str().to_os_string()
                } else if arg.contains(INPUT_TOKEN) {
                    OsString::from(arg.replace(INPUT_TOKEN, &input.to_string_lossy()))
                } else {
                    OsString::from(arg)
                }
            })
            .collect()
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.program
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let binary = which::which(&self.program).map_err(|_| ExtractionError::CommandNotFound {
            command: self.program.clone(),
        })?;

        let args = self.build_args(path);
        debug!(command = %self.program, input = %path.display(), "Running extractor");

        let child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractionError::Io {
                path: binary.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ExtractionError::Io {
                path: binary.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ExtractionError::Timeout {
                    command: self.program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            if stderr.trim().chars().count() > STDERR_EXCERPT {
                excerpt.push_str("...");
            }
            return Err(ExtractionError::CommandFailed {
                command: self.program.clone(),
                status: output.status.code(),
                stderr: redact_error_message(&excerpt),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

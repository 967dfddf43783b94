//! Tracing setup and structured logging helpers.
//!
//! The subscriber honours `RUST_LOG`; without it the filter defaults to
//! `longwrite=info,warn` (or `longwrite=debug,info` when verbose). Events go
//! to stderr; stdout carries only command output.

use tracing::{Level, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, minimal
    #[default]
    Compact,
    /// Compact plus targets and span close events with timings
    Verbose,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Pick a format from the CLI flags.
    #[must_use]
    pub fn from_flags(verbose: bool, json: bool) -> Self {
        match (json, verbose) {
            (true, _) => Self::Json,
            (false, true) => Self::Verbose,
            (false, false) => Self::Compact,
        }
    }

    fn default_directives(self) -> &'static str {
        match self {
            Self::Verbose => "longwrite=debug,info",
            Self::Compact | Self::Json => "longwrite=info,warn",
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format.default_directives()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Verbose => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .compact(),
                )
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .compact(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Span wrapping one work item inside a stage worker.
pub fn item_span(stage: &str, worker: usize, item_id: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "item",
        stage = %stage,
        worker = worker,
        item_id = %item_id,
    )
}

/// Span wrapping a whole stage run.
pub fn stage_span(stage: &str, workers: usize) -> tracing::Span {
    span!(Level::INFO, "stage", stage = %stage, workers = workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_flags() {
        assert_eq!(LogFormat::from_flags(false, false), LogFormat::Compact);
        assert_eq!(LogFormat::from_flags(true, false), LogFormat::Verbose);
        assert_eq!(LogFormat::from_flags(true, true), LogFormat::Json);
        assert_eq!(LogFormat::from_flags(false, true), LogFormat::Json);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            LogFormat::Verbose.default_directives(),
            "longwrite=debug,info"
        );
        assert_eq!(LogFormat::Compact.default_directives(), "longwrite=info,warn");
    }
}

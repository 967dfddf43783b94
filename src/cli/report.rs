//! Error output for the CLI.

use longwrite_utils::error::{LongwriteError, UserFriendlyError};
use longwrite_utils::exit_codes::ExitCode;
use longwrite_utils::redaction::redact_error_message;

/// Print a typed error with its suggestions.
pub(crate) fn print_error(error: &LongwriteError, operation: &str) {
    eprintln!(
        "✗ {operation} failed: {}",
        redact_error_message(&error.user_message())
    );
    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        eprintln!("\n  Suggestions:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            eprintln!("    {}. {}", i + 1, suggestion);
        }
    }
}

/// Print a command failure and pick its exit code.
pub(crate) fn report_failure(error: &anyhow::Error, operation: &str) -> ExitCode {
    match error.downcast_ref::<LongwriteError>() {
        Some(typed) => {
            print_error(typed, operation);
            typed.to_exit_code()
        }
        None => {
            eprintln!(
                "✗ Unexpected error: {}",
                redact_error_message(&format!("{error:#}"))
            );
            eprintln!("\n  Run with --verbose for more detailed output.");
            ExitCode::INTERNAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longwrite_utils::error::StoreError;
    use std::path::PathBuf;

    #[test]
    fn test_typed_errors_keep_their_exit_code() {
        let error = anyhow::Error::from(LongwriteError::Store(StoreError::LockHeld {
            path: PathBuf::from("write.jsonl.lock"),
        }));
        assert_eq!(report_failure(&error, "write"), ExitCode::LOCK_HELD);
    }

    #[test]
    fn test_context_does_not_hide_the_typed_error() {
        use anyhow::Context;
        let result: Result<(), LongwriteError> = Err(LongwriteError::Store(StoreError::LockHeld {
            path: PathBuf::from("plan.jsonl.lock"),
        }));
        let error = result.context("running plan stage").unwrap_err();
        assert_eq!(report_failure(&error, "plan"), ExitCode::LOCK_HELD);
    }

    #[test]
    fn test_untyped_errors_are_internal() {
        let error = anyhow::anyhow!("boom");
        assert_eq!(report_failure(&error, "plan"), ExitCode::INTERNAL);
    }
}

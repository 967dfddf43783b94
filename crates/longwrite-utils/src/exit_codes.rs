//! Exit code constants and error mapping for longwrite.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 9 | `LOCK_HELD` | Another run holds the stage output lock |
//! | 11 | `STORE_IO` | JSONL store could not be read or written |
//! | 12 | `TEMPLATE` | Prompt template missing or invalid |
//! | 13 | `EXTRACTION` | Source document extraction failed |
//! | 70 | `GENERATION_FAILURE` | Remote generation failed outside the retry loop |

use crate::error::{LlmError, LongwriteError, StoreError};

/// Exit codes matching the table above.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric
/// value for `std::process::exit()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments or configuration error
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Lock held - another run is writing the same stage output
    pub const LOCK_HELD: ExitCode = ExitCode(9);

    /// Store I/O failure
    pub const STORE_IO: ExitCode = ExitCode(11);

    /// Template failure
    pub const TEMPLATE: ExitCode = ExitCode(12);

    /// Extraction failure
    pub const EXTRACTION: ExitCode = ExitCode(13);

    /// Generation failure - remote call failed in a way the stage could not absorb
    pub const GENERATION_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl LongwriteError {
    /// Map this error onto the CLI exit code table.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Llm(LlmError::Misconfiguration(_)) => ExitCode::CLI_ARGS,
            Self::Llm(_) => ExitCode::GENERATION_FAILURE,
            Self::Store(StoreError::LockHeld { .. }) => ExitCode::LOCK_HELD,
            Self::Store(_) => ExitCode::STORE_IO,
            Self::Template(_) => ExitCode::TEMPLATE,
            Self::Extraction(_) => ExitCode::EXTRACTION,
            Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

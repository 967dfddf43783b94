//! Foundation utilities shared by every longwrite crate.

pub mod digest;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;
pub mod types;

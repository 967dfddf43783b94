//! Redaction of secrets from error messages before they reach logs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern to match URLs with embedded credentials
static URL_WITH_CREDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://)[^:@\s]+:[^@\s]+@").expect("valid regex"));

/// Bearer tokens echoed back by proxies
static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=-]+").expect("valid regex"));

/// Potential API keys: runs of 32+ key-safe characters.
///
/// Only the leading delimiter is consumed, so keys separated by a single
/// character are each matched.
static POTENTIAL_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{32,}").expect("valid regex"));

/// Redact sensitive information from an error message.
///
/// - URLs with embedded credentials keep scheme and host only
/// - `Bearer <token>` loses the token
/// - long key-like runs become `[REDACTED_KEY]`
#[must_use]
pub fn redact_error_message(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = BEARER.replace_all(&redacted, "$1[REDACTED]");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, "${1}[REDACTED_KEY]");
    redacted.into_owned()
}

/// Mask a secret for display, keeping only its length class.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        "<unset>".to_string()
    } else {
        format!("<set, {} chars>", secret.chars().count())
    }
}

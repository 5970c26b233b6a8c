//! Error types for `event-llm`.
//!
//! All variants include `[event-llm]` in their message so logs and
//! bubbled-up errors can be attributed to this crate at a glance.

use thiserror::Error;

/// Convenient result alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdaptersError>;

/// Root error type for the `event-llm` crate.
#[derive(Debug, Error)]
pub enum AdaptersError {
    /// Required environment variable is missing or empty.
    #[error("[event-llm] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("[event-llm] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in config.
    #[error("[event-llm] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g. invalid URL).
    #[error("[event-llm] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// Transport/HTTP client error.
    #[error("[event-llm] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("[event-llm] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
        snippet: String,
    },

    /// Request exceeded its bounded timeout.
    #[error("[event-llm] request to {0} timed out")]
    Timeout(String),

    /// Unexpected/invalid JSON response (either transport-level or
    /// structured-output parsing).
    #[error("[event-llm] failed to decode response: {0}")]
    Decode(String),

    /// The model produced no usable output (empty string after trimming).
    #[error("[event-llm] empty output from provider")]
    EmptyOutput,
}

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AdaptersError::MissingVar(name)),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| AdaptersError::InvalidNumber {
                var: name,
                reason: "expected u32",
            }),
        _ => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(AdaptersError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}

/// Produces a short, loggable snippet of a (possibly large) response body.
pub fn make_snippet(body: &str) -> String {
    body.chars().take(240).collect()
}

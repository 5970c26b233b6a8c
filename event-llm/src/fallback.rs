//! Fail-closed fallback diagnostics (§4.2, §7).
//!
//! Every adapter call that cannot complete normally (exception, missing
//! credentials, rate limit, timeout, empty output) produces one of these
//! instead of propagating a raw transport error to a client-facing layer.

use serde::Serialize;

/// Which adapter entry point produced the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackSource {
    IntentClassifier,
    EntityExtractor,
    Verbalizer,
}

/// What provoked the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    LlmException,
    MissingCredentials,
    RateLimited,
    Timeout,
    EmptyOutput,
    VerifierViolation,
}

/// A structured record of why a deterministic fallback was used instead of
/// an LLM result. In non-prod this is surfaced in full; in prod the
/// caller (the `api` layer) redacts it to a single generic sentence.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackReason {
    pub source: FallbackSource,
    pub trigger: FallbackTrigger,
    /// Named checks that failed (e.g. hard-fact names for a verifier
    /// violation); empty for transport-level fallbacks.
    pub failed_checks: Vec<String>,
    /// Short, non-sensitive context (e.g. the step name, thread id).
    pub context: String,
    /// The underlying error, stringified (never the original `Err` type —
    /// this struct must stay `Serialize` and loggable on its own).
    pub error: String,
}

impl FallbackReason {
    pub fn new(
        source: FallbackSource,
        trigger: FallbackTrigger,
        context: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            source,
            trigger,
            failed_checks: Vec::new(),
            context: context.into(),
            error: error.into(),
        }
    }

    pub fn with_failed_checks(mut self, checks: Vec<String>) -> Self {
        self.failed_checks = checks;
        self
    }
}

//! Crate-wide error hierarchy for `workflow-core`.
//!
//! Mirrors the teacher's root `Error` shape: one root error with
//! `#[error(transparent)]` variants wrapping each collaborator's error
//! type, so `?` works everywhere and nothing escapes the orchestrator's
//! outer handler unconverted.

use thiserror::Error;

use catalog_store::error::{CatalogError, StoreError};
use event_llm::AdaptersError;

/// Convenient alias for crate-wide results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Root error type for the `workflow-core` crate.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Adapters(#[from] AdaptersError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The step loop hopped between steps more than `MAX_STEP_HOPS` times
    /// in a single inbound-message tick without settling.
    #[error("workflow exceeded the maximum number of step hops in a single tick")]
    TooManyHops,

    #[error("unknown conversation thread: {0}")]
    UnknownThread(String),

    #[error("unknown HIL task: {0}")]
    UnknownTask(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Deployment environment, controlling how much error detail reaches the
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Dev,
    Staging,
    Prod,
}

impl Env {
    pub fn from_env() -> Self {
        match std::env::var("ENV").as_deref() {
            Ok("prod") => Env::Prod,
            Ok("staging") => Env::Staging,
            _ => Env::Dev,
        }
    }
}

/// What the `api` layer shows the client: a draft body, a "sent to
/// manager" HIL-pending marker, or an explicit error.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientOutcome {
    Draft(String),
    HilPending,
    Error { code: &'static str, message: String },
}

impl WorkflowError {
    /// Maps this error to a client-visible outcome, redacting detail
    /// outside of `Env::Dev`/`Env::Staging`.
    pub fn into_client_outcome(self, env: Env) -> ClientOutcome {
        let code = self.error_code();
        let message = match env {
            Env::Prod => "We hit a system error processing your message.".to_string(),
            Env::Dev | Env::Staging => self.to_string(),
        };
        ClientOutcome::Error { code, message }
    }

    fn error_code(&self) -> &'static str {
        match self {
            WorkflowError::Adapters(_) => "ADAPTERS_ERROR",
            WorkflowError::Store(_) => "STORE_ERROR",
            WorkflowError::Catalog(_) => "CATALOG_ERROR",
            WorkflowError::TooManyHops => "TOO_MANY_HOPS",
            WorkflowError::UnknownThread(_) => "UNKNOWN_THREAD",
            WorkflowError::UnknownTask(_) => "UNKNOWN_TASK",
            WorkflowError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

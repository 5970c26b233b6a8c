use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::core::app_state::ConfigError;
use crate::core::http::response_envelope::ApiResponse;

/// Public application error type. Route handlers return `AppResult<T>`;
/// this is the single place HTTP status and error code are decided.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unknown conversation thread: {0}")]
    NotFound(String),

    #[error("missing or invalid API key")]
    Unauthorized,

    /// A workflow-core error, mapped through
    /// [`workflow_core::WorkflowError::into_client_outcome`] so production
    /// deployments never leak internal detail to the client.
    #[error(transparent)]
    Workflow(#[from] workflow_core::WorkflowError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Bind(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Workflow(err) => match err {
                workflow_core::WorkflowError::UnknownThread(_) | workflow_core::WorkflowError::UnknownTask(_) => StatusCode::NOT_FOUND,
                workflow_core::WorkflowError::Store(catalog_store::error::StoreError::Conflict { .. }) => StatusCode::CONFLICT,
                workflow_core::WorkflowError::Store(catalog_store::error::StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Workflow(_) => "WORKFLOW_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let env = workflow_core::Env::from_env();

        let message = match self {
            AppError::Workflow(err) => match err.into_client_outcome(env) {
                workflow_core::ClientOutcome::Error { message, .. } => message,
                _ => "internal error".to_string(),
            },
            other => other.to_string(),
        };

        ApiResponse::<()>::error(code, message, Vec::new()).into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;

#[derive(Debug, Serialize)]
struct HealthBody {
    env: &'static str,
    rate_limit_rps: u32,
    detection_mode: String,
}

/// `GET /health` — liveness probe; also surfaces `RATE_LIMIT_RPS` per §6
/// ("read and surfaced in `/health` but not enforced here").
#[instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let env = match state.config.env {
        workflow_core::Env::Dev => "dev",
        workflow_core::Env::Staging => "staging",
        workflow_core::Env::Prod => "prod",
    };
    ApiResponse::success(HealthBody {
        env,
        rate_limit_rps: state.config.rate_limit_rps,
        detection_mode: state.config.detection_mode.clone(),
    })
    .into_response()
}

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppResult;

/// `GET /hil/tasks` — pending manager-review queue (spec §6 `list_pending_tasks`).
#[instrument(skip(state))]
pub async fn list_pending_tasks(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let tasks = state.store.list_pending_tasks().await;
    Ok(ApiResponse::success(tasks).into_response())
}

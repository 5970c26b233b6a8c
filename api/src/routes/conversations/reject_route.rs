use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppResult;

/// `POST /conversations/:id/reject` — terminal transition, bypasses the
/// step loop (spec §6 `reject_booking`).
#[instrument(skip(state), fields(thread_id = %thread_id))]
pub async fn reject_booking(State(state): State<Arc<AppState>>, Path(thread_id): Path<String>) -> AppResult<Response> {
    let lock = state.lock_for_thread(&thread_id).await;
    let _guard = lock.lock_owned().await;

    let result = workflow_core::Orchestrator::reject_booking(&state.store, &thread_id).await?;
    Ok(ApiResponse::success(result).into_response())
}

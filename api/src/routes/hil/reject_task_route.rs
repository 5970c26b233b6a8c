use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppResult;
use crate::routes::hil::reject_task_request::RejectTaskRequest;
use crate::routes::hil::review_response::ReviewResponse;

/// `POST /hil/tasks/:id/reject` — records the rejection; the step retries
/// on the client's next inbound message (spec §6 `reject_task`).
#[instrument(skip(state, req), fields(task_id = %task_id))]
pub async fn reject_task(State(state): State<Arc<AppState>>, Path(task_id): Path<String>, Json(req): Json<RejectTaskRequest>) -> AppResult<Response> {
    workflow_core::Orchestrator::handle_hil_decision(&state.store, &task_id, false, req.notes, None).await?;

    Ok(ApiResponse::success(ReviewResponse {
        assistant_reply: None,
        thread_id: None,
        review_state: "rejected",
    })
    .into_response())
}

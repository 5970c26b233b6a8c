use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppResult;
use crate::routes::hil::approve_task_request::ApproveTaskRequest;
use crate::routes::hil::review_response::ReviewResponse;

/// `POST /hil/tasks/:id/approve` — releases the (possibly edited) draft to
/// the client (spec §6 `approve_task`).
#[instrument(skip(state, req), fields(task_id = %task_id))]
pub async fn approve_task(State(state): State<Arc<AppState>>, Path(task_id): Path<String>, Json(req): Json<ApproveTaskRequest>) -> AppResult<Response> {
    let reply = workflow_core::Orchestrator::handle_hil_decision(&state.store, &task_id, true, req.notes, req.edited_message).await?;

    let assistant_reply = if reply.response.is_empty() { None } else { Some(reply.response) };
    Ok(ApiResponse::success(ReviewResponse {
        assistant_reply,
        thread_id: Some(reply.session_id),
        review_state: "approved",
    })
    .into_response())
}

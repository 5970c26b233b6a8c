use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::{AppError, AppResult};
use crate::routes::conversations::send_message_request::SendMessageRequest;

/// `POST /conversations/:id/messages` — continues an existing thread
/// (spec §6 `send_message`).
#[instrument(skip(state, req), fields(thread_id = %thread_id))]
pub async fn send_message(State(state): State<Arc<AppState>>, Path(thread_id): Path<String>, Json(req): Json<SendMessageRequest>) -> AppResult<Response> {
    let lock = state.lock_for_thread(&thread_id).await;
    let _guard = lock.lock_owned().await;

    let conversation = state
        .store
        .load_conversation(&thread_id)
        .await
        .ok_or_else(|| AppError::NotFound(thread_id.clone()))?;

    let reply = workflow_core::Orchestrator::handle_inbound(
        &state.store,
        &state.catalog,
        &state.adapters,
        &thread_id,
        &conversation.client_email,
        &req.body,
        Utc::now(),
        Utc::now().date_naive(),
    )
    .await?;

    Ok(ApiResponse::success(reply).into_response())
}

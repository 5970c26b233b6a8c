use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::{AppError, AppResult};
use crate::routes::conversations::confirm_date_request::ConfirmDateRequest;

/// `POST /conversations/:id/confirm-date` — a UI shortcut equivalent to the
/// client sending a date-confirmation message (spec §6 `confirm_date`).
#[instrument(skip(state, req), fields(thread_id = %thread_id))]
pub async fn confirm_date(State(state): State<Arc<AppState>>, Path(thread_id): Path<String>, Json(req): Json<ConfirmDateRequest>) -> AppResult<Response> {
    let lock = state.lock_for_thread(&thread_id).await;
    let _guard = lock.lock_owned().await;

    let conversation = state
        .store
        .load_conversation(&thread_id)
        .await
        .ok_or_else(|| AppError::NotFound(thread_id.clone()))?;

    let body = format!("Can you confirm {}?", req.date_iso.format("%Y-%m-%d"));

    let reply = workflow_core::Orchestrator::handle_inbound(
        &state.store,
        &state.catalog,
        &state.adapters,
        &thread_id,
        &conversation.client_email,
        &body,
        Utc::now(),
        Utc::now().date_naive(),
    )
    .await?;

    Ok(ApiResponse::success(reply).into_response())
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum::response::Response;
use chrono::Utc;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppResult;
use crate::routes::conversations::start_conversation_request::StartConversationRequest;

/// `POST /conversations` — creates a thread and runs the orchestrator once
/// on the opening message (spec §6 `start_conversation`).
#[instrument(skip(state, req), fields(client_email = %req.client_email))]
pub async fn start_conversation(State(state): State<Arc<AppState>>, Json(req): Json<StartConversationRequest>) -> AppResult<Response> {
    let thread_id = services::stable_uuid(&format!("{}:{}", req.client_email, Utc::now().timestamp_nanos_opt().unwrap_or_default())).to_string();
    let lock = state.lock_for_thread(&thread_id).await;
    let _guard = lock.lock_owned().await;

    let reply = workflow_core::Orchestrator::handle_inbound(
        &state.store,
        &state.catalog,
        &state.adapters,
        &thread_id,
        &req.client_email,
        &req.body,
        Utc::now(),
        Utc::now().date_naive(),
    )
    .await?;

    Ok(ApiResponse::success(reply).into_response_with_status(StatusCode::CREATED))
}

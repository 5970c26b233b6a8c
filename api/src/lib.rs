//! HTTP façade for the event-inquiry conversation engine (§6). Thin by
//! design: every route loads/validates, calls into `workflow-core`, and
//! wraps the result in [`core::http::response_envelope::ApiResponse`].

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use core::app_state::{AppConfig, AppState};
use error_handler::AppError;

/// Builds the router for a given state — split out from [`start`] so tests
/// can mount it on an in-process client without binding a real socket.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.allowed_origins);
    let body_limit_bytes = (state.config.request_size_limit_kb as usize) * 1024;

    Router::new()
        .route("/health", get(routes::health_route::health))
        .route("/conversations", post(routes::conversations::start_conversation_route::start_conversation))
        .route(
            "/conversations/{thread_id}/messages",
            post(routes::conversations::send_message_route::send_message),
        )
        .route(
            "/conversations/{thread_id}/confirm-date",
            post(routes::conversations::confirm_date_route::confirm_date),
        )
        .route(
            "/conversations/{thread_id}/accept",
            post(routes::conversations::accept_route::accept_booking),
        )
        .route(
            "/conversations/{thread_id}/reject",
            post(routes::conversations::reject_route::reject_booking),
        )
        .route("/hil/tasks", get(routes::hil::list_tasks_route::list_pending_tasks))
        .route("/hil/tasks/{task_id}/approve", post(routes::hil::approve_task_route::approve_task))
        .route("/hil/tasks/{task_id}/reject", post(routes::hil::reject_task_route::reject_task))
        .layer(axum_middleware::from_fn(middleware_layer::json_extractor::json_error_mapper))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    }
    let origins: Vec<HeaderValue> = allowed_origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    CorsLayer::new().allow_methods([Method::GET, Method::POST]).allow_origin(origins)
}

/// Boots the HTTP façade: reads configuration, wires the in-memory catalog
/// and conversation store, and serves until the process is killed.
pub async fn start() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    info!(bind_addr = %config.bind_addr, env = ?config.env, "starting event-inquiry conversation engine");

    let state = AppState::bootstrap(config.clone()).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.map_err(AppError::Bind)?;
    info!(bind_addr = %config.bind_addr, "listening");

    axum::serve(listener, app).await.map_err(AppError::Bind)?;
    Ok(())
}

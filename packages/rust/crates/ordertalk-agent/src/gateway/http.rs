//! HTTP gateway: order-talk turns, session clear/history, health.
//!
//! Request validation (400 for empty session_id or content), 504 when a turn
//! exceeds its timeout. A timed-out turn is dropped before persisting anything.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::contracts::{ChatRequest, ContentItem, DEFAULT_USER_ID, UserInput};
use crate::pipeline::Pipeline;
use crate::session::Message;

/// Default timeout for one turn (three model calls plus one business call).
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 120;

/// Request body for `POST /api/v1/logistics/order_talk`.
#[derive(Debug, Deserialize)]
pub struct OrderTalkRequest {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub content: Vec<ContentItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderTalkResponse {
    pub reply: String,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct SessionClearRequest {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClearResponse {
    pub cleared: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub user_id: String,
    pub messages: Vec<Message>,
}

/// Shared state for the HTTP server: pipeline + per-turn timeout + optional concurrency limit.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub turn_timeout_secs: u64,
    /// When Some, limits concurrent turns; excess requests wait for a slot.
    pub concurrency_semaphore: Option<Arc<Semaphore>>,
    pub max_concurrent_turns: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayHealthResponse {
    pub status: String,
    pub turn_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_turns: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_flight_turns: Option<usize>,
    pub session_backend: String,
    pub active_sessions: usize,
}

fn user_id_or_default(user_id: Option<&str>) -> String {
    user_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string()
}

/// Validate and normalize an order-talk body; 400 for empty session_id or content.
///
/// # Errors
/// `(400, reason)` when a required part is empty.
pub fn validate_order_talk_request(
    body: OrderTalkRequest,
) -> Result<ChatRequest, (StatusCode, String)> {
    let session_id = body.session_id.trim().to_string();
    if session_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "session_id must be non-empty".to_string(),
        ));
    }
    let content = UserInput::new(body.content);
    if content.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "content must contain at least one non-empty item".to_string(),
        ));
    }
    Ok(ChatRequest::new(
        session_id,
        user_id_or_default(body.user_id.as_deref()),
        content,
    ))
}

async fn handle_order_talk(
    State(state): State<GatewayState>,
    Json(body): Json<OrderTalkRequest>,
) -> Result<Json<OrderTalkResponse>, (StatusCode, String)> {
    let request = validate_order_talk_request(body)?;
    let _permit = if let Some(ref sem) = state.concurrency_semaphore {
        Some(sem.acquire().await.map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "concurrency limit closed".to_string(),
            )
        })?)
    } else {
        None
    };
    let timeout_secs = state.turn_timeout_secs;
    let session_id = request.session_id.clone();
    match tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        state.pipeline.handle(request),
    )
    .await
    {
        Ok(envelope) => Ok(Json(OrderTalkResponse {
            reply: envelope.message,
            success: envelope.success,
        })),
        Err(_) => {
            tracing::warn!(
                session_id = %session_id,
                timeout_secs,
                "turn timed out; nothing persisted"
            );
            Err((
                StatusCode::GATEWAY_TIMEOUT,
                format!("turn timed out after {timeout_secs}s"),
            ))
        }
    }
}

async fn handle_session_clear(
    State(state): State<GatewayState>,
    Json(body): Json<SessionClearRequest>,
) -> Result<Json<SessionClearResponse>, (StatusCode, String)> {
    let session_id = body.session_id.trim();
    if session_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "session_id must be non-empty".to_string(),
        ));
    }
    let user_id = user_id_or_default(body.user_id.as_deref());
    state
        .pipeline
        .clear(&user_id, session_id)
        .await
        .map_err(|error| (StatusCode::INTERNAL_SERVER_ERROR, format!("{error:#}")))?;
    Ok(Json(SessionClearResponse { cleared: true }))
}

async fn handle_session_history(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SessionHistoryResponse>, (StatusCode, String)> {
    let user_id = user_id_or_default(query.user_id.as_deref());
    let messages = state
        .pipeline
        .history(&user_id, &session_id)
        .await
        .map_err(|error| (StatusCode::INTERNAL_SERVER_ERROR, format!("{error:#}")))?;
    Ok(Json(SessionHistoryResponse {
        session_id,
        user_id,
        messages,
    }))
}

async fn handle_health(State(state): State<GatewayState>) -> Json<GatewayHealthResponse> {
    let in_flight_turns = state.max_concurrent_turns.and_then(|max| {
        state
            .concurrency_semaphore
            .as_ref()
            .map(|sem| max.saturating_sub(sem.available_permits()))
    });
    Json(GatewayHealthResponse {
        status: "healthy".to_string(),
        turn_timeout_secs: state.turn_timeout_secs,
        max_concurrent_turns: state.max_concurrent_turns,
        in_flight_turns,
        session_backend: state.pipeline.store().backend_name().to_string(),
        active_sessions: state.pipeline.gate().active_sessions(),
    })
}

/// Build the gateway router.
pub fn router(
    pipeline: Arc<Pipeline>,
    turn_timeout_secs: u64,
    max_concurrent_turns: Option<usize>,
) -> Router {
    let concurrency_semaphore = max_concurrent_turns.map(|n| Arc::new(Semaphore::new(n)));
    let state = GatewayState {
        pipeline,
        turn_timeout_secs,
        concurrency_semaphore,
        max_concurrent_turns,
    };
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/v1/logistics/order_talk", post(handle_order_talk))
        .route("/api/v1/logistics/sessions/clear", post(handle_session_clear))
        .route(
            "/api/v1/logistics/sessions/{session_id}/history",
            get(handle_session_history),
        )
        .with_state(state)
}

/// Run the HTTP server on `bind_addr`; graceful shutdown on Ctrl+C and SIGTERM.
///
/// # Errors
/// Fails when the address cannot be bound or the server stops with an I/O error.
pub async fn run_http(
    pipeline: Pipeline,
    bind_addr: &str,
    turn_timeout_secs: Option<u64>,
    max_concurrent_turns: Option<usize>,
) -> Result<()> {
    let timeout = turn_timeout_secs.unwrap_or(DEFAULT_TURN_TIMEOUT_SECS);
    let app = router(Arc::new(pipeline), timeout, max_concurrent_turns);
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway on {bind_addr}"))?;
    let max_str = max_concurrent_turns.map_or_else(|| "unlimited".to_string(), |n| n.to_string());
    tracing::info!(
        bind = %bind_addr,
        turn_timeout_secs = timeout,
        max_concurrent = %max_str,
        "gateway listening (Ctrl+C/SIGTERM to stop)"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let ctrl_c = tokio::signal::ctrl_c();
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "SIGTERM handler unavailable; waiting for Ctrl+C");
                let _ = ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %error, "failed to listen for Ctrl+C");
        }
    }
}

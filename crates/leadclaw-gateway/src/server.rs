//! HTTP server implementation using Axum.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use leadclaw_core::error::Result;

use crate::events;
use crate::reconciler::WebhookReconciler;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<WebhookReconciler>,
    pub start_time: std::time::Instant,
}

/// Liveness probe.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "OK",
        "uptime": state.start_time.elapsed().as_secs(),
        "timestamp": chrono::Utc::now(),
    }))
}

/// Dialer outcome webhook. Always 200: the provider retries on anything
/// else, and an unreconcilable payload stays unreconcilable. The body is
/// taken as raw bytes so even non-JSON garbage gets acknowledged.
async fn call_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let payload: Option<Value> = serde_json::from_slice(&body).ok();
    match payload.as_ref().and_then(events::parse_call_webhook) {
        Some(event) => {
            if let Err(e) = state.reconciler.apply(event).await {
                tracing::warn!("⚠️ Call webhook reconciliation failed: {e}");
            }
        }
        None => tracing::debug!("Unreconcilable call webhook payload; acknowledged"),
    }
    StatusCode::OK
}

/// Calendar booking webhook. Same acknowledgement contract.
async fn booking_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let payload: Option<Value> = serde_json::from_slice(&body).ok();
    match payload.as_ref().and_then(events::parse_booking_webhook) {
        Some(event) => {
            if let Err(e) = state.reconciler.apply(event).await {
                tracing::warn!("⚠️ Booking webhook reconciliation failed: {e}");
            }
        }
        None => tracing::debug!("Booking webhook without attendees; acknowledged"),
    }
    StatusCode::OK
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/call-webhook", post(call_webhook))
        .route("/booking-webhook", post(booking_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::new(state))
}

/// Bind and serve the gateway until the process exits.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Gateway listening on {addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

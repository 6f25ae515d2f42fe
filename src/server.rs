//! Webhook server — receives Bot API updates over HTTP.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::bot::IntakeBot;
use crate::channels::parse_update;
use crate::config::WEBHOOK_PATH;

/// Build the Axum router with the webhook and health routes.
pub fn webhook_routes(bot: Arc<IntakeBot>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(webhook).fallback(method_not_allowed))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(bot)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "publisher-intake"
    }))
}

// ── Webhook ─────────────────────────────────────────────────────────────

/// POST /api/webhook
///
/// Always answers 200 once the body parses, so Telegram does not redeliver
/// an update we already acted on.
async fn webhook(
    State(bot): State<Arc<IntakeBot>>,
    Json(update): Json<serde_json::Value>,
) -> impl IntoResponse {
    match parse_update(&update) {
        Some(event) => {
            let chat_id = event.chat_id();
            if let Err(e) = bot.handle(event).await {
                error!(chat_id, error = %e, "Failed to handle webhook update");
            }
        }
        None => debug!(
            update_id = update.get("update_id").and_then(|v| v.as_i64()),
            "Ignoring unsupported update"
        ),
    }
    (StatusCode::OK, "OK")
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

//! Webhook HTTP server (single port).

use crate::bridge::Bridge;
use crate::channels::TelegramUpdate;
use crate::config::{normalized_path, Config};
use crate::runtime::{build_bridge, shutdown_signal};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header Telegram uses to echo the secret given to setWebhook.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    pub bridge: Arc<Bridge>,
    /// When Some, every POST must carry this value in [`SECRET_HEADER`].
    pub secret: Option<String>,
}

/// Router with `GET /` (health) and `POST {path}` (updates).
pub fn webhook_router(state: WebhookState, path: &str) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route(&normalized_path(path), post(telegram_webhook))
        .with_state(state)
}

/// Run webhook mode: register the webhook, serve until SIGINT/SIGTERM, then remove it.
/// Requires the bot token and the public webhook URL.
pub async fn run_webhook(config: Config) -> Result<()> {
    let endpoint = config.require_webhook_endpoint()?;
    let (bridge, telegram) = build_bridge(&config)?;
    let secret = config.webhook_secret();

    if let Err(e) = telegram.set_webhook(&endpoint, secret.as_deref()).await {
        log::warn!("telegram set_webhook failed: {}", e);
    } else {
        log::info!("telegram webhook registered: {}", endpoint);
    }

    let app = webhook_router(
        WebhookState { bridge, secret },
        &config.telegram.webhook_path,
    );
    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("starting bot with webhook on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;

    if let Err(e) = telegram.delete_webhook().await {
        log::debug!("telegram delete_webhook on shutdown: {}", e);
    }
    log::info!("webhook server stopped");
    Ok(())
}

/// POST webhook: verifies the optional secret, decodes the update and answers 200 right away.
/// The update is handled on its own task so a slow backend never holds Telegram's request open.
async fn telegram_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(ref expected) = state.secret {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !secret_matches(provided, expected) {
            log::warn!("webhook: rejected update with missing or wrong secret");
            return StatusCode::FORBIDDEN;
        }
    }
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            log::debug!("webhook: undecodable update: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };
    let bridge = state.bridge.clone();
    tokio::spawn(async move {
        bridge.handle_update(&update).await;
    });
    StatusCode::OK
}

fn secret_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<WebhookState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "mode": "webhook",
        "sessions": state.bridge.registry().len().await,
    }))
}

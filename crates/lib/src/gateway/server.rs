//! Gateway HTTP server.

use crate::config::{self, Config};
use crate::geocoding::GeocodingClient;
use crate::webhook::protocol::WebhookRequest;
use crate::webhook::{self, GeocodeHandlerError};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Header Dialogflow attaches when the webhook is configured with a shared
/// secret (generic web service custom request headers).
const SECRET_HEADER: &str = "x-webhook-secret";

/// Shared state for the gateway (config, geocoding client, auth).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// When Some, POST / must carry a matching X-Webhook-Secret header.
    pub required_token: Option<String>,
    pub geocoder: GeocodingClient,
}

/// When auth mode is token and a token is configured, returns it for request validation.
fn require_webhook_token(config: &Config) -> Option<String> {
    if config.gateway.auth.mode == config::GatewayAuthMode::Token {
        config::resolve_gateway_token(config)
    } else {
        None
    }
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// When bind is not loopback, a gateway token must be configured or startup fails.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        let token = config::resolve_gateway_token(&config);
        if token.is_none() || config.gateway.auth.mode != config::GatewayAuthMode::Token {
            anyhow::bail!(
                "refusing to bind gateway to {} without auth (set gateway.auth.mode to \"token\" and gateway.auth.token or CXHOOK_GATEWAY_TOKEN)",
                bind
            );
        }
    }

    let required_token = require_webhook_token(&config);
    let api_key = config::resolve_geocoding_api_key(&config);
    let geocoder = GeocodingClient::new(config.geocoding.base_url.clone(), api_key);

    let state = GatewayState {
        config: Arc::new(config.clone()),
        required_token,
        geocoder,
    };

    let app = Router::new()
        .route("/", get(health_http).post(webhook_http))
        .with_state(state);

    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

/// POST / — the webhook entry point; verifies the optional secret, parses
/// the request, dispatches on the tag.
async fn webhook_http(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(ref expected) = state.required_token {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != expected.as_str() {
            return StatusCode::FORBIDDEN.into_response();
        }
    }
    let req: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("rejecting malformed webhook body: {}", e);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "malformed request body" })))
                .into_response();
        }
    };

    let today = chrono::Local::now().date_naive();
    match webhook::fulfill(&req, &state.config.fulfillment, &state.geocoder, today).await {
        Ok(res) => Json(res).into_response(),
        Err(err @ GeocodeHandlerError::MissingParameters) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(GeocodeHandlerError::Lookup(e)) => {
            log::warn!("geocode lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "geocoding lookup failed" })),
            )
                .into_response()
        }
    }
}

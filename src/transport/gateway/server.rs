use super::AppState;
use super::handlers::{handle_cluster, handle_health, handle_rank};

use crate::config::{Config, GatewayConfig};
use crate::core::taste::create_taste_engine;
use crate::error::ErrorEnvelope;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

/// Returns true when the bind address is not a loopback address.
fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Run the HTTP gateway on `host:port` until Ctrl-C.
pub async fn run_gateway(host: &str, port: u16, config: Arc<Config>) -> Result<()> {
    if is_public_bind(host) {
        warn!(host, "Gateway is binding to a non-loopback address");
    }

    let addr = resolve_bind_addr(host, port).await?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(listener, config).await
}

/// Resolve `host` (IPv4, IPv6 with or without brackets, or a hostname).
pub(super) async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("resolve gateway bind address {host}"))?
        .next()
        .with_context(|| format!("no address found for {host}"))
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: Arc<Config>,
) -> Result<()> {
    let local = listener.local_addr().context("read gateway address")?;

    // One engine (and one embedding provider) for the process lifetime
    let engine = create_taste_engine(&config).context("create taste engine")?;
    info!(
        addr = %local,
        provider = engine.provider_name(),
        dimensions = engine.dimensions(),
        "Gateway listening"
    );

    let app = build_router(AppState { engine }, &config.gateway);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve gateway")?;

    info!("Gateway stopped");
    Ok(())
}

pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/calculate_preferences", post(handle_cluster))
        .route("/cluster", post(handle_cluster))
        .route("/recommend", post(handle_rank))
        .route("/rank", post(handle_rank))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(middleware::map_response(envelope_layer_errors))
}

/// Rewrites the plain-text rejections of the body-limit and timeout layers
/// into the JSON error envelope the handlers use.
async fn envelope_layer_errors(response: Response) -> Response {
    let message = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        _ => return response,
    };
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }
    (response.status(), Json(ErrorEnvelope::new(message, None))).into_response()
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

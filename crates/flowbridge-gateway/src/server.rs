// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use flowbridge_core::BridgeError;
use flowbridge_core::types::InboundMessage;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Queue feeding `GatewayChannel::receive`.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    pub auth: AuthConfig,
    pub start_time: Instant,
}

/// Gateway server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the gateway routes:
/// - GET /health (public)
/// - POST /v1/typebot/webhook (public)
/// - POST /v1/inbound (bearer auth)
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/typebot/webhook", post(handlers::post_typebot_webhook))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/inbound", post(handlers::post_inbound))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// Binds `host:port` and serves the gateway until the task is aborted.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), BridgeError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BridgeError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(addr = addr.as_str(), "gateway server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| BridgeError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}

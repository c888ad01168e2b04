// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles POST /v1/inbound, POST /v1/typebot/webhook and GET /health.

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use flowbridge_core::types::{InboundMessage, MessageContent, TicketRef};

use crate::server::GatewayState;

/// Channel name assumed when an inbound event does not name one.
pub const DEFAULT_CHANNEL: &str = "whatsapp";

/// How long a handler waits for room in the inbound queue.
const ENQUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Request body for POST /v1/inbound.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    /// Transport message id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Transport address of the sender.
    pub sender: String,
    #[serde(default)]
    pub push_name: Option<String>,
    pub content: MessageContent,
    #[serde(default)]
    pub integration: Option<String>,
    #[serde(default)]
    pub ticket: Option<TicketRef>,
    /// ISO 8601 timestamp; the receive time when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl InboundRequest {
    fn into_message(self) -> InboundMessage {
        InboundMessage {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            channel: self.channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            sender_id: self.sender,
            push_name: self.push_name,
            content: self.content,
            integration: self.integration,
            ticket: self.ticket,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Response body for an accepted inbound event.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub id: String,
}

/// Acknowledgement returned to Typebot webhook calls.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// POST /v1/inbound
///
/// Queues one transport event for the bridge loop and answers 202 once queued.
pub async fn post_inbound(
    State(state): State<GatewayState>,
    Json(body): Json<InboundRequest>,
) -> Response {
    if body.sender.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "sender must not be empty");
    }

    let inbound = body.into_message();
    let id = inbound.id.clone();

    match tokio::time::timeout(ENQUEUE_TIMEOUT, state.inbound_tx.send(inbound)).await {
        Ok(Ok(())) => {
            tracing::debug!(message_id = id.as_str(), "inbound event queued");
            (StatusCode::ACCEPTED, Json(AcceptedResponse { id })).into_response()
        }
        Ok(Err(_)) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "bridge is not accepting messages",
        ),
        Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "inbound queue is full"),
    }
}

/// POST /v1/typebot/webhook
///
/// Typebot calls this from webhook blocks; the payload is only logged.
pub async fn post_typebot_webhook(Json(body): Json<serde_json::Value>) -> Json<WebhookAck> {
    tracing::debug!(payload = %body, "typebot webhook received");
    Json(WebhookAck {
        success: true,
        message: "received".to_string(),
    })
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

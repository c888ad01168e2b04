// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of outbound messages and presence updates to the transport.
//!
//! Every event is POSTed as JSON to the configured `outbound_url`. The
//! transport may answer with `{"id": "..."}` to report its message id.

use std::time::Duration;

use flowbridge_core::BridgeError;
use flowbridge_core::types::{PresenceState, TransportMessage};
use serde::{Deserialize, Serialize};

/// One event posted to the transport.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent<'a> {
    Message {
        channel: &'a str,
        recipient: &'a str,
        content: &'a TransportMessage,
    },
    Presence {
        recipient: &'a str,
        state: PresenceState,
    },
}

#[derive(Debug, Deserialize)]
struct DeliveryReceipt {
    #[serde(default)]
    id: Option<String>,
}

/// HTTP client for the transport's outbound endpoint.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    client: reqwest::Client,
    url: String,
    bearer_token: Option<String>,
}

impl OutboundClient {
    pub fn new(
        url: &str,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Channel {
                message: format!("failed to build outbound HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            url: url.to_string(),
            bearer_token,
        })
    }

    /// Posts `event`, returning the transport's message id when it sent one.
    pub async fn post(&self, event: &OutboundEvent<'_>) -> Result<Option<String>, BridgeError> {
        let mut request = self.client.post(&self.url).json(event);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| BridgeError::Channel {
            message: format!("outbound delivery failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| BridgeError::Channel {
            message: format!("failed to read outbound response: {e}"),
            source: Some(Box::new(e)),
        })?;
        if !status.is_success() {
            return Err(BridgeError::Channel {
                message: format!("transport returned {status}: {text}"),
                source: None,
            });
        }

        Ok(serde_json::from_str::<DeliveryReceipt>(&text)
            .ok()
            .and_then(|receipt| receipt.id))
    }
}

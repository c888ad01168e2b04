// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Typebot chat API.
//!
//! Provides [`TypebotClient`] which builds `startChat` / `continueChat`
//! requests and translates transport, status and decoding failures into
//! [`BridgeError`] variants.

use std::time::Duration;

use flowbridge_core::BridgeError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::types::{ChatResponse, ContinueChatRequest, PrefilledVariables, StartChatRequest};

/// Placeholder message and result id used to open a session.
const START_MESSAGE: &str = "start";

/// HTTP client bound to one Typebot flow.
#[derive(Debug, Clone)]
pub struct TypebotClient {
    client: reqwest::Client,
    base_url: String,
    flow_slug: String,
    timeout: Duration,
}

impl TypebotClient {
    /// Creates a client for `flow_slug` on the Typebot instance at `base_url`.
    pub fn new(base_url: &str, flow_slug: &str, timeout: Duration) -> Result<Self, BridgeError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::FlowEngine {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            flow_slug: flow_slug.to_string(),
            timeout,
        })
    }

    pub fn start_url(&self) -> String {
        format!("{}/api/v1/typebots/{}/startChat", self.base_url, self.flow_slug)
    }

    pub fn continue_url(&self, session_id: &str) -> String {
        format!("{}/api/v1/sessions/{session_id}/continueChat", self.base_url)
    }

    /// Opens a session with the contact prefilled. The response must carry a `sessionId`.
    pub async fn start_chat(
        &self,
        number: &str,
        push_name: &str,
    ) -> Result<(String, ChatResponse), BridgeError> {
        let request = StartChatRequest {
            is_stream_enabled: true,
            message: START_MESSAGE.to_string(),
            result_id: START_MESSAGE.to_string(),
            is_only_registering: false,
            prefilled_variables: PrefilledVariables {
                number: number.to_string(),
                push_name: push_name.to_string(),
            },
        };

        let mut response = self.post(&self.start_url(), &request).await?;
        let session_id = response
            .session_id
            .take()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BridgeError::MalformedPayload {
                message: "startChat response has no sessionId".into(),
            })?;
        Ok((session_id, response))
    }

    /// Sends one user message into an existing session.
    pub async fn continue_chat(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatResponse, BridgeError> {
        let request = ContinueChatRequest {
            message: message.to_string(),
        };
        self.post(&self.continue_url(session_id), &request).await
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<ChatResponse, BridgeError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        debug!(status = %status, url, "typebot response received");

        let text = response.text().await.map_err(|e| self.request_error(e))?;
        if !status.is_success() {
            return Err(BridgeError::FlowEngine {
                message: format!("typebot returned {status}: {text}"),
                source: None,
            });
        }

        serde_json::from_str(&text).map_err(|e| BridgeError::MalformedPayload {
            message: format!("failed to parse typebot response: {e}"),
        })
    }

    fn request_error(&self, e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout {
                duration: self.timeout,
            }
        } else {
            BridgeError::FlowEngine {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

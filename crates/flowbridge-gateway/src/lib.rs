// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway implementing ChannelAdapter.
//!
//! Inbound transport events arrive on an axum server and are queued for the
//! bridge loop. Outbound messages and presence updates are POSTed to the
//! transport's `outbound_url`. The crate also provides [`HttpTicketing`],
//! the helpdesk client used for ownership changes.

pub mod auth;
pub mod handlers;
pub mod outbound;
pub mod server;
pub mod ticketing;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use flowbridge_config::model::GatewayConfig;
use flowbridge_core::BridgeError;
use flowbridge_core::traits::adapter::PluginAdapter;
use flowbridge_core::traits::channel::ChannelAdapter;
use flowbridge_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
    PresenceState,
};

use crate::auth::AuthConfig;
use crate::outbound::{OutboundClient, OutboundEvent};
use crate::server::{GatewayState, ServerConfig};

pub use ticketing::HttpTicketing;

/// Capacity of the queue between HTTP handlers and `receive()`.
const INBOUND_QUEUE_CAPACITY: usize = 256;

/// HTTP gateway implementing ChannelAdapter.
///
/// The axum server runs as a background task after `connect()`. Handlers push
/// inbound events into an mpsc queue that `receive()` drains.
pub struct GatewayChannel {
    config: GatewayConfig,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    outbound: Option<OutboundClient>,
    server_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl GatewayChannel {
    pub fn new(config: GatewayConfig) -> Result<Self, BridgeError> {
        let outbound = config
            .outbound_url
            .as_deref()
            .map(|url| {
                OutboundClient::new(
                    url,
                    config.outbound_bearer_token.clone(),
                    Duration::from_secs(config.outbound_timeout_secs),
                )
            })
            .transpose()?;

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
        Ok(Self {
            config,
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            outbound,
            server_handle: Mutex::new(None),
        })
    }

    fn outbound(&self) -> Result<&OutboundClient, BridgeError> {
        self.outbound.as_ref().ok_or_else(|| BridgeError::Channel {
            message: "gateway has no outbound_url configured".to_string(),
            source: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for GatewayChannel {
    fn name(&self) -> &str {
        "gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        let handle = self.server_handle.lock().await;
        match handle.as_ref() {
            Some(h) if !h.is_finished() => Ok(HealthStatus::Healthy),
            Some(_) => Ok(HealthStatus::Unhealthy("server stopped".to_string())),
            None => Ok(HealthStatus::Unhealthy("server not started".to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        if let Some(h) = self.server_handle.lock().await.take() {
            h.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for GatewayChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: self.outbound.is_some(),
            supports_images: true,
            supports_voice: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), BridgeError> {
        let server_config = ServerConfig {
            host: self.config.host.clone(),
            port: self.config.port,
        };
        let state = GatewayState {
            inbound_tx: self.inbound_tx.clone(),
            auth: AuthConfig {
                bearer_token: self.config.bearer_token.clone(),
            },
            start_time: std::time::Instant::now(),
        };

        let handle = tokio::spawn(async move {
            if let Err(e) = server::start_server(&server_config, state).await {
                tracing::error!(error = %e, "gateway server error");
            }
        });
        *self.server_handle.lock().await = Some(handle);

        tracing::info!(
            host = self.config.host.as_str(),
            port = self.config.port,
            "gateway channel connected"
        );
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BridgeError> {
        let id = self
            .outbound()?
            .post(&OutboundEvent::Message {
                channel: &msg.channel,
                recipient: &msg.recipient,
                content: &msg.content,
            })
            .await?;
        Ok(MessageId(
            id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        ))
    }

    async fn send_presence(
        &self,
        recipient: &str,
        state: PresenceState,
    ) -> Result<(), BridgeError> {
        self.outbound()?
            .post(&OutboundEvent::Presence { recipient, state })
            .await
            .map(|_| ())
    }

    async fn receive(&self) -> Result<InboundMessage, BridgeError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or(BridgeError::ChannelClosed)
    }
}

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and an ordered log of presence updates and sends for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use flowbridge_core::BridgeError;
use flowbridge_core::traits::adapter::PluginAdapter;
use flowbridge_core::traits::channel::ChannelAdapter;
use flowbridge_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
    PresenceState,
};

/// Something the bridge did on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Presence {
        recipient: String,
        state: PresenceState,
    },
    Sent(OutboundMessage),
}

/// A mock messaging channel for testing.
///
/// - **inbound**: messages injected via `inject_message()` are returned by `receive()`
/// - **events**: presence updates and sends, in call order
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    events: Arc<Mutex<Vec<ChannelEvent>>>,
    notify: Arc<Notify>,
    closed: AtomicBool,
    fail_sends: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            events: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Queue a message for the next `receive()`.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Once the queue is empty, `receive()` reports the channel as closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Make every following `send()` fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<ChannelEvent> {
        self.events.lock().await.clone()
    }

    /// Messages that were delivered, in order.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|event| match event {
                ChannelEvent::Sent(msg) => Some(msg.clone()),
                ChannelEvent::Presence { .. } => None,
            })
            .collect()
    }

    /// Text payloads of delivered messages; media is skipped.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent_messages()
            .await
            .iter()
            .filter_map(|msg| msg.content.as_text().map(String::from))
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent_messages().await.len()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            supports_images: true,
            supports_voice: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BridgeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BridgeError::Channel {
                message: format!("mock send to {} rejected", msg.recipient),
                source: None,
            });
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.events.lock().await.push(ChannelEvent::Sent(msg));
        Ok(MessageId(id))
    }

    async fn send_presence(
        &self,
        recipient: &str,
        state: PresenceState,
    ) -> Result<(), BridgeError> {
        self.events.lock().await.push(ChannelEvent::Presence {
            recipient: recipient.to_string(),
            state,
        });
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, BridgeError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(BridgeError::ChannelClosed);
            }
            self.notify.notified().await;
        }
    }
}

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging transports.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MessageId, OutboundMessage, PresenceState};

/// Adapter for a bidirectional messaging transport.
///
/// The bridge only uses three outbound primitives: presence updates, text
/// sends and media sends (the latter two both go through [`send`](Self::send)).
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), BridgeError>;

    /// Sends a text or media message.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, BridgeError>;

    /// Updates the typing indicator shown to `recipient`.
    async fn send_presence(&self, recipient: &str, state: PresenceState)
        -> Result<(), BridgeError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, BridgeError>;
}

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paced delivery of one flow engine reply.
//!
//! Units are formatted and sent in engine order. Every outgoing message is
//! preceded by a typing indicator and the integration's message delay. A
//! terminal directive ends the batch and is handed back to the caller; the
//! dispatcher itself never changes conversation ownership.

use flowbridge_config::IntegrationConfig;
use flowbridge_core::types::{
    BotReplyUnit, FlowReply, OutboundMessage, PresenceState, TransportMessage,
};
use flowbridge_core::{BridgeError, ChannelAdapter};
use tracing::{debug, warn};

use crate::directive::{self, ControlDirective};
use crate::formatter;

/// How a dispatch ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Every unit, the prompt and any fallback were sent.
    Delivered { sent: usize },
    /// A terminal directive stopped the batch.
    Directive {
        sent: usize,
        directive: ControlDirective,
    },
    /// A send failed; the rest of the batch was dropped.
    Abandoned { sent: usize, error: BridgeError },
}

impl DispatchOutcome {
    pub fn sent(&self) -> usize {
        match self {
            DispatchOutcome::Delivered { sent }
            | DispatchOutcome::Directive { sent, .. }
            | DispatchOutcome::Abandoned { sent, .. } => *sent,
        }
    }
}

/// Sends replies to one recipient on one channel.
pub struct Dispatcher<'a> {
    channel: &'a dyn ChannelAdapter,
    channel_name: &'a str,
    recipient: &'a str,
    integration: &'a IntegrationConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        channel: &'a dyn ChannelAdapter,
        channel_name: &'a str,
        recipient: &'a str,
        integration: &'a IntegrationConfig,
    ) -> Self {
        Self {
            channel,
            channel_name,
            recipient,
            integration,
        }
    }

    /// Delivers `reply`: units in order, then the prompt, or the fallback text
    /// when the reply is empty.
    pub async fn dispatch(&self, reply: &FlowReply) -> DispatchOutcome {
        let mut sent = 0;

        for unit in &reply.units {
            let message = formatter::format_unit(unit, self.integration);

            if let (BotReplyUnit::Text(_), Some(text)) = (unit, message.as_text())
                && let Some(directive) = directive::interpret(text)
            {
                if directive.is_terminal() {
                    debug!(recipient = self.recipient, ?directive, "directive ends reply batch");
                    return DispatchOutcome::Directive { sent, directive };
                }
                if let ControlDirective::Malformed { reason } = &directive {
                    warn!(
                        recipient = self.recipient,
                        reason = reason.as_str(),
                        "malformed directive sent as text"
                    );
                }
            }

            if let Err(error) = self.send_paced(message).await {
                return self.abandon(sent, error);
            }
            sent += 1;
        }

        if let Some(prompt) = formatter::format_prompt(&reply.prompt) {
            if let Err(error) = self.send_paced(prompt).await {
                return self.abandon(sent, error);
            }
            sent += 1;
        }

        if reply.is_empty() && self.integration.fallback_on_empty {
            let fallback = TransportMessage::text(self.integration.unknown_reply_text.clone());
            if let Err(error) = self.send_paced(fallback).await {
                return self.abandon(sent, error);
            }
            sent += 1;
        }

        DispatchOutcome::Delivered { sent }
    }

    /// Typing indicator, delay, paused indicator, then the message.
    pub async fn send_paced(&self, content: TransportMessage) -> Result<(), BridgeError> {
        let typing = self.channel.capabilities().supports_typing;

        if typing {
            self.presence(PresenceState::Composing).await;
        }
        tokio::time::sleep(self.integration.message_delay()).await;
        if typing {
            self.presence(PresenceState::Paused).await;
        }

        self.send_now(content).await
    }

    /// Sends without typing indicator or delay.
    pub async fn send_now(&self, content: TransportMessage) -> Result<(), BridgeError> {
        let id = self
            .channel
            .send(OutboundMessage {
                channel: self.channel_name.to_string(),
                recipient: self.recipient.to_string(),
                content,
            })
            .await?;
        debug!(recipient = self.recipient, message_id = %id.0, "message sent");
        Ok(())
    }

    async fn presence(&self, state: PresenceState) {
        if let Err(e) = self.channel.send_presence(self.recipient, state).await {
            debug!(recipient = self.recipient, %state, error = %e, "presence update failed");
        }
    }

    fn abandon(&self, sent: usize, error: BridgeError) -> DispatchOutcome {
        warn!(recipient = self.recipient, sent, error = %error, "send failed, abandoning reply batch");
        DispatchOutcome::Abandoned { sent, error }
    }
}

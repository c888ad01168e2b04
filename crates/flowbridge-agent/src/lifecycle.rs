// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle and ownership state of conversations.
//!
//! [`SessionManager`] decides between starting and continuing a flow session,
//! applies idle expiry, and performs every ownership change: directive
//! hand-offs, restart and finish keywords. When a ticket is linked, the
//! ticketing collaborator is updated first and local state only changes once
//! it accepted the update.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use flowbridge_config::IntegrationConfig;
use flowbridge_core::types::{
    ContactInfo, Conversation, ConversationStatus, FlowReply, InboundMessage, OwnerAssignment,
    TicketUpdate,
};
use flowbridge_core::{BridgeError, ConversationStore, FlowEngineAdapter, TicketingAdapter};
use tracing::{debug, error, info, warn};

use crate::directive::ControlDirective;

/// Result of the flow engine leg of a turn.
#[derive(Debug)]
pub enum EngineTurn {
    /// Automation is off; the engine was not called.
    Inactive,
    Replied(FlowReply),
    /// The engine call failed and the session was cleared.
    Failed(BridgeError),
}

/// Owns conversation state transitions.
pub struct SessionManager {
    store: Arc<dyn ConversationStore>,
    ticketing: Option<Arc<dyn TicketingAdapter>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        ticketing: Option<Arc<dyn TicketingAdapter>>,
    ) -> Self {
        Self { store, ticketing }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Loads the conversation for `msg`, creating it on first contact.
    ///
    /// A closed conversation is reopened under the bot, and a conversation
    /// moving to another integration loses its session.
    pub async fn load_or_create(
        &self,
        msg: &InboundMessage,
        integration: &IntegrationConfig,
        now: DateTime<Utc>,
    ) -> Result<Conversation, BridgeError> {
        let id = msg.conversation_id();

        let Some(mut conversation) = self.store.get_conversation(&id).await? else {
            let mut conversation =
                Conversation::new(id, msg.sender_id.clone(), integration.name.clone(), now);
            conversation.ticket = msg.ticket;
            self.store.create_conversation(&conversation).await?;
            info!(
                conversation_id = %conversation.id,
                integration = integration.name.as_str(),
                "conversation created"
            );
            return Ok(conversation);
        };

        let mut changed = false;

        if conversation.status == ConversationStatus::Closed {
            conversation.status = ConversationStatus::Open;
            conversation.session_id = None;
            conversation.automation_active = true;
            conversation.owner = OwnerAssignment::Bot;
            changed = true;
            info!(conversation_id = %conversation.id, "closed conversation reopened");
        }

        if conversation.integration != integration.name {
            info!(
                conversation_id = %conversation.id,
                from = conversation.integration.as_str(),
                to = integration.name.as_str(),
                "integration changed, clearing session"
            );
            conversation.integration = integration.name.clone();
            conversation.session_id = None;
            changed = true;
        }

        if msg.ticket.is_some() && msg.ticket != conversation.ticket {
            conversation.ticket = msg.ticket;
            changed = true;
        }

        if changed {
            self.persist(&conversation).await?;
        }
        Ok(conversation)
    }

    /// Drops an idle session and re-arms automation. Returns whether it expired.
    pub async fn apply_expiry(
        &self,
        conversation: &mut Conversation,
        integration: &IntegrationConfig,
        now: DateTime<Utc>,
    ) -> Result<bool, BridgeError> {
        let expiry = integration.session_expiry();
        if expiry.is_zero() {
            return Ok(false);
        }
        let Some(cutoff) = TimeDelta::from_std(expiry)
            .ok()
            .and_then(|delta| now.checked_sub_signed(delta))
        else {
            return Ok(false);
        };
        if conversation.last_activity_at >= cutoff {
            return Ok(false);
        }

        conversation.session_id = None;
        conversation.automation_active = true;
        self.persist(conversation).await?;
        info!(
            conversation_id = %conversation.id,
            idle_since = %conversation.last_activity_at,
            "session expired"
        );
        Ok(true)
    }

    /// Runs the engine leg: start a session if needed, then continue it with `body`.
    ///
    /// A new session is persisted, and the linked ticket bound to the
    /// integration, before the first continue call. Engine failures clear the
    /// session and are reported as [`EngineTurn::Failed`]; only storage
    /// failures return `Err`.
    pub async fn converse(
        &self,
        conversation: &mut Conversation,
        integration: &IntegrationConfig,
        engine: &dyn FlowEngineAdapter,
        contact: &ContactInfo,
        body: &str,
    ) -> Result<EngineTurn, BridgeError> {
        if !conversation.automation_active {
            debug!(conversation_id = %conversation.id, "automation inactive, engine not called");
            return Ok(EngineTurn::Inactive);
        }

        let session_id = match conversation.session_id.clone() {
            Some(session_id) => session_id,
            None => {
                let started = match engine.start_session(contact).await {
                    Ok(started) => started,
                    Err(e) => return self.engine_failed(conversation, e).await,
                };
                self.bind_ticket(conversation, integration).await;
                conversation.session_id = Some(started.session_id.clone());
                conversation.automation_active = true;
                conversation.owner = OwnerAssignment::Bot;
                self.persist(conversation).await?;
                info!(
                    conversation_id = %conversation.id,
                    session_id = %started.session_id,
                    discarded_units = started.reply.units.len(),
                    "flow session started"
                );
                started.session_id
            }
        };

        match engine.continue_session(&session_id, body).await {
            Ok(reply) => Ok(EngineTurn::Replied(reply)),
            Err(e) => self.engine_failed(conversation, e).await,
        }
    }

    /// Marks the linked ticket as served by `integration`.
    ///
    /// A rejection is logged and the session is kept: the flow session
    /// already exists and the bot owns the conversation either way.
    async fn bind_ticket(&self, conversation: &Conversation, integration: &IntegrationConfig) {
        let update = TicketUpdate {
            automation_active: Some(true),
            integration_id: integration.integration_id.map(Some),
            ..TicketUpdate::default()
        };
        if let Err(e) = self.update_ticket(conversation, &update).await {
            warn!(
                conversation_id = %conversation.id,
                integration = integration.name.as_str(),
                error = %e,
                "ticket not bound to integration"
            );
        }
    }

    async fn engine_failed(
        &self,
        conversation: &mut Conversation,
        e: BridgeError,
    ) -> Result<EngineTurn, BridgeError> {
        if matches!(e, BridgeError::MalformedPayload { .. }) {
            warn!(conversation_id = %conversation.id, error = %e, "flow engine returned malformed payload");
        } else {
            error!(conversation_id = %conversation.id, error = %e, "flow engine call failed");
        }
        conversation.session_id = None;
        self.persist(conversation).await?;
        Ok(EngineTurn::Failed(e))
    }

    /// Applies a terminal directive emitted by the flow.
    pub async fn apply_directive(
        &self,
        conversation: &mut Conversation,
        directive: &ControlDirective,
    ) -> Result<(), BridgeError> {
        match directive {
            ControlDirective::ReleaseToHuman { queue_id, user_id } => {
                let update = TicketUpdate {
                    queue_id: Some(queue_id.clone()),
                    user_id: user_id.clone(),
                    automation_active: Some(false),
                    integration_id: Some(None),
                    ..TicketUpdate::default()
                };
                self.update_ticket(conversation, &update).await?;

                conversation.owner = match user_id {
                    Some(user) => OwnerAssignment::Agent(user.clone()),
                    None => OwnerAssignment::Queue(queue_id.clone()),
                };
                conversation.automation_active = false;
                conversation.session_id = None;
                self.persist(conversation).await?;
                info!(
                    conversation_id = %conversation.id,
                    queue_id = %queue_id,
                    user_id = ?user_id,
                    "conversation released to human"
                );
            }
            ControlDirective::StopAutomation => {
                let update = TicketUpdate {
                    automation_active: Some(false),
                    integration_id: Some(None),
                    ..TicketUpdate::default()
                };
                self.update_ticket(conversation, &update).await?;

                conversation.owner = OwnerAssignment::Unassigned;
                conversation.automation_active = false;
                conversation.session_id = None;
                self.persist(conversation).await?;
                info!(conversation_id = %conversation.id, "automation stopped by flow");
            }
            ControlDirective::Malformed { .. } => {}
        }
        Ok(())
    }

    /// Restart keyword: drop the session and give the conversation back to the bot.
    pub async fn restart(&self, conversation: &mut Conversation) -> Result<(), BridgeError> {
        conversation.session_id = None;
        conversation.automation_active = true;
        conversation.owner = OwnerAssignment::Bot;
        self.persist(conversation).await?;
        info!(conversation_id = %conversation.id, "conversation restarted by keyword");
        Ok(())
    }

    /// Finish keyword: close the ticket, then the conversation.
    pub async fn finish(&self, conversation: &mut Conversation) -> Result<(), BridgeError> {
        let update = TicketUpdate {
            status: Some(ConversationStatus::Closed),
            automation_active: Some(false),
            integration_id: Some(None),
            ..TicketUpdate::default()
        };
        self.update_ticket(conversation, &update).await?;

        conversation.status = ConversationStatus::Closed;
        conversation.automation_active = false;
        conversation.owner = OwnerAssignment::Unassigned;
        conversation.session_id = None;
        self.persist(conversation).await?;
        info!(conversation_id = %conversation.id, "conversation finished by keyword");
        Ok(())
    }

    /// Records the end of a processed message.
    pub async fn touch(
        &self,
        conversation: &mut Conversation,
        now: DateTime<Utc>,
    ) -> Result<(), BridgeError> {
        conversation.last_activity_at = now;
        self.persist(conversation).await
    }

    async fn persist(&self, conversation: &Conversation) -> Result<(), BridgeError> {
        self.store.update_conversation(conversation).await
    }

    async fn update_ticket(
        &self,
        conversation: &Conversation,
        update: &TicketUpdate,
    ) -> Result<(), BridgeError> {
        let (Some(ticketing), Some(ticket)) = (&self.ticketing, conversation.ticket) else {
            debug!(
                conversation_id = %conversation.id,
                "no linked ticket, ownership change is local only"
            );
            return Ok(());
        };

        ticketing
            .update_ticket(ticket, update)
            .await
            .map_err(|e| match e {
                BridgeError::Ownership { .. } => e,
                other => BridgeError::Ownership {
                    message: format!("ticket {} update failed: {other}", ticket.ticket_id),
                    source: Some(Box::new(other)),
                },
            })
    }
}

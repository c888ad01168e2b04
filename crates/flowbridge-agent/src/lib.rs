// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session bridge between a messaging channel and flow engines.
//!
//! The [`BridgeService`] processes one inbound message end to end:
//! - Resolves the integration and the conversation
//! - Applies idle expiry, then starts or continues the flow session
//! - Delivers the flow's reply units with pacing, honoring control directives
//! - Applies restart and finish keywords
//!
//! The [`BridgeLoop`] feeds it from a channel adapter, running turns of
//! different conversations concurrently. Turns of the same conversation run
//! one at a time, in the order their messages were received.

pub mod directive;
pub mod dispatch;
pub mod formatter;
pub mod keywords;
pub mod lifecycle;
pub mod locks;
pub mod shutdown;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flowbridge_config::IntegrationConfig;
use flowbridge_core::types::{ContactInfo, InboundMessage, TransportMessage};
use flowbridge_core::{
    BridgeError, ChannelAdapter, ConversationId, ConversationStore, FlowEngineAdapter,
    TicketingAdapter,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::directive::ControlDirective;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::keywords::KeywordAction;
use crate::lifecycle::{EngineTurn, SessionManager};
use crate::locks::{ConversationLocks, TurnTicket};

/// Pause after a receive error that did not close the channel.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A configured integration and the engine serving it.
pub struct Integration {
    pub config: IntegrationConfig,
    pub engine: Arc<dyn FlowEngineAdapter>,
}

/// Why an inbound message was dropped before touching any conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Broadcast,
    UnknownIntegration,
}

/// What the flow engine did during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Automation was off for the conversation.
    Inactive,
    Replied,
    Failed,
}

/// Summary of a processed turn.
#[derive(Debug)]
pub struct TurnReport {
    pub conversation_id: ConversationId,
    pub engine: EngineStatus,
    /// Transport messages delivered, pacing included.
    pub sent: usize,
    /// A send failed and the rest of the batch was dropped.
    pub abandoned: bool,
    pub directive: Option<ControlDirective>,
    pub keywords: Vec<KeywordAction>,
}

#[derive(Debug)]
pub enum TurnOutcome {
    Ignored(IgnoreReason),
    Processed(TurnReport),
}

/// Processes inbound messages against conversation state.
pub struct BridgeService {
    channel: Arc<dyn ChannelAdapter>,
    integrations: HashMap<String, Integration>,
    sessions: SessionManager,
    locks: ConversationLocks,
}

impl BridgeService {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        store: Arc<dyn ConversationStore>,
        ticketing: Option<Arc<dyn TicketingAdapter>>,
    ) -> Self {
        Self {
            channel,
            integrations: HashMap::new(),
            sessions: SessionManager::new(store, ticketing),
            locks: ConversationLocks::new(),
        }
    }

    /// Registers an integration under its configured name.
    pub fn with_integration(
        mut self,
        config: IntegrationConfig,
        engine: Arc<dyn FlowEngineAdapter>,
    ) -> Self {
        info!(
            integration = config.name.as_str(),
            flow_slug = config.flow_slug.as_str(),
            "integration registered"
        );
        self.integrations
            .insert(config.name.clone(), Integration { config, engine });
        self
    }

    pub fn channel(&self) -> &Arc<dyn ChannelAdapter> {
        &self.channel
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        self.sessions.store()
    }

    /// Conversations with a turn in flight or waiting.
    pub fn active_conversations(&self) -> usize {
        self.locks.active()
    }

    /// The integration named by the message, or the only one configured.
    fn resolve_integration(&self, name: Option<&str>) -> Option<&Integration> {
        match name {
            Some(name) => self.integrations.get(name),
            None if self.integrations.len() == 1 => self.integrations.values().next(),
            None => None,
        }
    }

    /// Takes `msg`'s place in its conversation's turn order.
    ///
    /// Turns of one conversation run in reservation order, whatever order
    /// the tasks carrying them are scheduled in.
    pub fn reserve_turn(&self, msg: &InboundMessage) -> TurnTicket {
        self.locks.reserve(&msg.conversation_id())
    }

    /// Runs one inbound message through the bridge.
    ///
    /// Engine and delivery failures are absorbed into the report. Storage and
    /// ticketing failures are returned.
    pub async fn handle_inbound(&self, msg: InboundMessage) -> Result<TurnOutcome, BridgeError> {
        let turn = self.reserve_turn(&msg);
        self.handle_turn(msg, turn).await
    }

    /// Runs `msg` once every turn reserved before `turn` has finished.
    pub async fn handle_turn(
        &self,
        msg: InboundMessage,
        turn: TurnTicket,
    ) -> Result<TurnOutcome, BridgeError> {
        let _guard = turn.acquire().await;

        if msg.is_broadcast() {
            debug!(message_id = msg.id.as_str(), "broadcast message ignored");
            return Ok(TurnOutcome::Ignored(IgnoreReason::Broadcast));
        }

        let Some(integration) = self.resolve_integration(msg.integration.as_deref()) else {
            warn!(
                message_id = msg.id.as_str(),
                integration = ?msg.integration,
                "no integration for inbound message"
            );
            return Ok(TurnOutcome::Ignored(IgnoreReason::UnknownIntegration));
        };
        let config = &integration.config;

        let conversation_id = msg.conversation_id();

        let now = Utc::now();
        let body = msg.content.body();
        let mut conversation = self.sessions.load_or_create(&msg, config, now).await?;
        self.sessions
            .apply_expiry(&mut conversation, config, now)
            .await?;

        let contact = ContactInfo {
            number: msg.contact_number(),
            push_name: msg.push_name.clone().unwrap_or_default(),
        };
        let dispatcher = Dispatcher::new(
            self.channel.as_ref(),
            msg.channel.as_str(),
            msg.sender_id.as_str(),
            config,
        );

        let mut report = TurnReport {
            conversation_id: conversation_id.clone(),
            engine: EngineStatus::Inactive,
            sent: 0,
            abandoned: false,
            directive: None,
            keywords: Vec::new(),
        };

        // Reported after the keywords, which run regardless.
        let mut directive_error = None;

        match self
            .sessions
            .converse(
                &mut conversation,
                config,
                integration.engine.as_ref(),
                &contact,
                &body,
            )
            .await?
        {
            EngineTurn::Inactive => {}
            EngineTurn::Failed(_) => report.engine = EngineStatus::Failed,
            EngineTurn::Replied(reply) => {
                report.engine = EngineStatus::Replied;
                match dispatcher.dispatch(&reply).await {
                    DispatchOutcome::Delivered { sent } => report.sent = sent,
                    DispatchOutcome::Directive { sent, directive } => {
                        report.sent = sent;
                        if let Err(e) = self
                            .sessions
                            .apply_directive(&mut conversation, &directive)
                            .await
                        {
                            directive_error = Some(e);
                        }
                        report.directive = Some(directive);
                    }
                    DispatchOutcome::Abandoned { sent, error } => {
                        warn!(
                            conversation_id = %conversation_id,
                            sent,
                            error = %error,
                            "reply delivery abandoned"
                        );
                        report.sent = sent;
                        report.abandoned = true;
                    }
                }
            }
        }

        for action in keywords::match_keywords(&body, config) {
            match action {
                KeywordAction::Restart => {
                    self.sessions.restart(&mut conversation).await?;
                    let ack = TransportMessage::text(config.restart_reply_text.clone());
                    match dispatcher.send_now(ack).await {
                        Ok(()) => report.sent += 1,
                        Err(e) => {
                            warn!(conversation_id = %conversation_id, error = %e, "restart acknowledgement failed");
                        }
                    }
                }
                KeywordAction::Finish => self.sessions.finish(&mut conversation).await?,
            }
            report.keywords.push(action);
        }

        self.sessions.touch(&mut conversation, Utc::now()).await?;

        if let Some(e) = directive_error {
            return Err(e);
        }

        debug!(
            conversation_id = %conversation_id,
            engine = ?report.engine,
            sent = report.sent,
            "turn processed"
        );
        Ok(TurnOutcome::Processed(report))
    }
}

/// Feeds channel messages into a [`BridgeService`] until shutdown.
pub struct BridgeLoop {
    service: Arc<BridgeService>,
    drain_timeout: Duration,
    tracker: TaskTracker,
}

impl BridgeLoop {
    pub fn new(service: Arc<BridgeService>, drain_timeout: Duration) -> Self {
        Self {
            service,
            drain_timeout,
            tracker: TaskTracker::new(),
        }
    }

    /// Runs until `cancel` fires or the channel closes, then drains in-flight
    /// turns and closes the store.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BridgeError> {
        info!("bridge loop running");

        loop {
            tokio::select! {
                received = self.service.channel().receive() => {
                    match received {
                        Ok(msg) => self.spawn_turn(msg),
                        Err(BridgeError::ChannelClosed) => {
                            info!("channel closed, stopping bridge loop");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bridge loop");
                    break;
                }
            }
        }

        shutdown::drain_tasks(&self.tracker, self.drain_timeout).await;
        self.service.store().close().await?;

        info!("bridge loop stopped");
        Ok(())
    }

    fn spawn_turn(&self, msg: InboundMessage) {
        // Reserved here, in receive order, before the task is scheduled.
        let turn = self.service.reserve_turn(&msg);
        let service = Arc::clone(&self.service);
        self.tracker.spawn(async move {
            let message_id = msg.id.clone();
            match service.handle_turn(msg, turn).await {
                Ok(TurnOutcome::Processed(_)) => {}
                Ok(TurnOutcome::Ignored(reason)) => {
                    debug!(message_id = message_id.as_str(), ?reason, "message ignored");
                }
                Err(e) => {
                    error!(message_id = message_id.as_str(), error = %e, "failed to handle inbound message");
                }
            }
        });
    }
}

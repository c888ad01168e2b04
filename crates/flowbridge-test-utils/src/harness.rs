// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end bridge tests.
//!
//! `TestHarness` assembles a [`BridgeService`] over a temp SQLite store and
//! the mock adapters. `send()` drives one inbound message through the full
//! turn pipeline.

use std::sync::Arc;

use flowbridge_agent::{BridgeService, TurnOutcome};
use flowbridge_config::IntegrationConfig;
use flowbridge_config::model::StorageConfig;
use flowbridge_core::types::{Conversation, InboundMessage, MessageContent, TicketRef};
use flowbridge_core::{
    BridgeError, ChannelAdapter, ConversationId, ConversationStore, FlowEngineAdapter,
    TicketingAdapter,
};
use flowbridge_storage::SqliteStorage;

use crate::mock_channel::MockChannel;
use crate::mock_engine::MockFlowEngine;
use crate::mock_ticketing::MockTicketing;

/// Channel name used by harness messages.
pub const TEST_CHANNEL: &str = "whatsapp";

/// Sender address used by [`TestHarness::send`].
pub const TEST_SENDER: &str = "5511999990000@s.whatsapp.net";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    integrations: Vec<IntegrationConfig>,
    engine: MockFlowEngine,
    ticketing: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            integrations: Vec::new(),
            engine: MockFlowEngine::new(),
            ticketing: true,
        }
    }

    /// Register an integration. Without any, a single `support` integration is used.
    pub fn with_integration(mut self, config: IntegrationConfig) -> Self {
        self.integrations.push(config);
        self
    }

    pub fn with_engine(mut self, engine: MockFlowEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Leave the bridge without a ticketing collaborator.
    pub fn without_ticketing(mut self) -> Self {
        self.ticketing = false;
        self
    }

    pub async fn build(self) -> Result<TestHarness, BridgeError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| BridgeError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn ConversationStore> = Arc::new(storage);

        let channel = Arc::new(MockChannel::new());
        let engine = Arc::new(self.engine);
        engine.observe_store(storage.clone());
        let ticketing = Arc::new(MockTicketing::new());

        let integrations = if self.integrations.is_empty() {
            vec![default_integration()]
        } else {
            self.integrations
        };

        let mut service = BridgeService::new(
            channel.clone() as Arc<dyn ChannelAdapter>,
            storage.clone(),
            self.ticketing
                .then(|| ticketing.clone() as Arc<dyn TicketingAdapter>),
        );
        for config in &integrations {
            service = service
                .with_integration(config.clone(), engine.clone() as Arc<dyn FlowEngineAdapter>);
        }

        Ok(TestHarness {
            channel,
            engine,
            ticketing,
            storage,
            service: Arc::new(service),
            integrations,
            _temp_dir: temp_dir,
        })
    }
}

/// The integration used when a test registers none: no pacing delay,
/// `restart` and `finish` keywords, expiry disabled.
pub fn default_integration() -> IntegrationConfig {
    let mut config = IntegrationConfig::new("support", "http://typebot.invalid", "support-flow");
    config.message_delay_ms = 0;
    config.keyword_restart = "restart".into();
    config.keyword_finish = "finish".into();
    config
}

/// A bridge over mock adapters and a temp database.
pub struct TestHarness {
    pub channel: Arc<MockChannel>,
    pub engine: Arc<MockFlowEngine>,
    /// Recorded even when built `without_ticketing`, in which case it stays empty.
    pub ticketing: Arc<MockTicketing>,
    pub storage: Arc<dyn ConversationStore>,
    pub service: Arc<BridgeService>,
    pub integrations: Vec<IntegrationConfig>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A text message from [`TEST_SENDER`].
    pub fn inbound(text: &str) -> InboundMessage {
        Self::inbound_from(TEST_SENDER, text)
    }

    pub fn inbound_from(sender: &str, text: &str) -> InboundMessage {
        InboundMessage {
            id: format!("in-{}", uuid::Uuid::new_v4()),
            channel: TEST_CHANNEL.to_string(),
            sender_id: sender.to_string(),
            push_name: Some("Test User".to_string()),
            content: MessageContent::text(text),
            integration: None,
            ticket: Some(TicketRef {
                ticket_id: 7,
                company_id: 1,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Runs a text message from [`TEST_SENDER`] through the bridge.
    pub async fn send(&self, text: &str) -> Result<TurnOutcome, BridgeError> {
        self.service.handle_inbound(Self::inbound(text)).await
    }

    pub async fn conversation(&self, sender: &str) -> Result<Option<Conversation>, BridgeError> {
        self.storage
            .get_conversation(&ConversationId::from_address(TEST_CHANNEL, sender))
            .await
    }
}

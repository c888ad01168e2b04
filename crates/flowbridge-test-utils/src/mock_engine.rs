// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock flow engine adapter for deterministic testing.
//!
//! `MockFlowEngine` implements `FlowEngineAdapter` with scripted replies and
//! records every call, so tests can assert how the bridge drove the engine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use flowbridge_core::traits::adapter::PluginAdapter;
use flowbridge_core::{BridgeError, ConversationStore};
use flowbridge_core::traits::flow::FlowEngineAdapter;
use flowbridge_core::types::{
    AdapterType, BotReplyUnit, ContactInfo, FlowReply, FlowSessionId, HealthStatus, RichText,
    StartedSession,
};

enum Scripted {
    Reply(FlowReply),
    Failure(String),
}

/// A flow engine answering continue calls from a FIFO script.
///
/// When the script is empty, continue calls return an empty reply.
pub struct MockFlowEngine {
    script: Mutex<VecDeque<Scripted>>,
    starts: Mutex<Vec<ContactInfo>>,
    continues: Mutex<Vec<(FlowSessionId, String)>>,
    observed_store: OnceLock<Arc<dyn ConversationStore>>,
    stored_at_continue: Mutex<Vec<Vec<FlowSessionId>>>,
    next_session: AtomicUsize,
    fail_start: AtomicBool,
    start_delay: Duration,
}

impl MockFlowEngine {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            starts: Mutex::new(Vec::new()),
            continues: Mutex::new(Vec::new()),
            observed_store: OnceLock::new(),
            stored_at_continue: Mutex::new(Vec::new()),
            next_session: AtomicUsize::new(1),
            fail_start: AtomicBool::new(false),
            start_delay: Duration::ZERO,
        }
    }

    /// Delay every `start_session` call, widening race windows in tests.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub async fn push_reply(&self, reply: FlowReply) {
        self.script.lock().await.push_back(Scripted::Reply(reply));
    }

    /// Queue a reply made of plain text units.
    pub async fn push_texts(&self, texts: &[&str]) {
        let units = texts
            .iter()
            .map(|text| BotReplyUnit::Text(RichText::plain(*text)))
            .collect();
        self.push_reply(FlowReply {
            units,
            ..FlowReply::default()
        })
        .await;
    }

    /// Queue a failing continue call.
    pub async fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Failure(message.to_string()));
    }

    /// Snapshot the session ids held by `store` on every continue call.
    ///
    /// Only the first store registered is observed.
    pub fn observe_store(&self, store: Arc<dyn ConversationStore>) {
        let _ = self.observed_store.set(store);
    }

    /// Session ids stored when each continue call arrived, in call order.
    pub async fn stored_sessions_at_continue(&self) -> Vec<Vec<FlowSessionId>> {
        self.stored_at_continue.lock().await.clone()
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub async fn start_count(&self) -> usize {
        self.starts.lock().await.len()
    }

    /// Contacts sessions were started for.
    pub async fn started_contacts(&self) -> Vec<ContactInfo> {
        self.starts.lock().await.clone()
    }

    /// `(session, message)` of every continue call, in order.
    pub async fn continue_calls(&self) -> Vec<(FlowSessionId, String)> {
        self.continues.lock().await.clone()
    }
}

impl Default for MockFlowEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockFlowEngine {
    fn name(&self) -> &str {
        "mock-flow-engine"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FlowEngine
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl FlowEngineAdapter for MockFlowEngine {
    async fn start_session(&self, contact: &ContactInfo) -> Result<StartedSession, BridgeError> {
        self.starts.lock().await.push(contact.clone());
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BridgeError::FlowEngine {
                message: "mock start rejected".into(),
                source: None,
            });
        }

        let n = self.next_session.fetch_add(1, Ordering::SeqCst);
        Ok(StartedSession {
            session_id: FlowSessionId(format!("mock-session-{n}")),
            reply: FlowReply {
                units: vec![BotReplyUnit::Text(RichText::plain("start placeholder"))],
                ..FlowReply::default()
            },
        })
    }

    async fn continue_session(
        &self,
        session_id: &FlowSessionId,
        message: &str,
    ) -> Result<FlowReply, BridgeError> {
        self.continues
            .lock()
            .await
            .push((session_id.clone(), message.to_string()));

        if let Some(store) = self.observed_store.get() {
            let stored = store
                .list_conversations(None)
                .await?
                .into_iter()
                .filter_map(|conversation| conversation.session_id)
                .collect();
            self.stored_at_continue.lock().await.push(stored);
        }

        match self.script.lock().await.pop_front() {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Failure(message)) => Err(BridgeError::FlowEngine {
                message,
                source: None,
            }),
            None => Ok(FlowReply::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactInfo {
        ContactInfo {
            number: "5511999990000".into(),
            push_name: "Ana".into(),
        }
    }

    #[tokio::test]
    async fn sessions_get_distinct_ids() {
        let engine = MockFlowEngine::new();
        let a = engine.start_session(&contact()).await.unwrap();
        let b = engine.start_session(&contact()).await.unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(engine.start_count().await, 2);
    }

    #[tokio::test]
    async fn script_is_consumed_in_order() {
        let engine = MockFlowEngine::new();
        engine.push_texts(&["one"]).await;
        engine.push_failure("boom").await;

        let session = FlowSessionId("s".into());
        let first = engine.continue_session(&session, "a").await.unwrap();
        assert_eq!(first.units.len(), 1);
        assert!(engine.continue_session(&session, "b").await.is_err());
        assert!(engine.continue_session(&session, "c").await.unwrap().is_empty());

        let calls = engine.continue_calls().await;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].1, "b");
    }

    #[tokio::test]
    async fn failing_start_is_an_engine_fault() {
        let engine = MockFlowEngine::new();
        engine.set_fail_start(true);
        let err = engine.start_session(&contact()).await.unwrap_err();
        assert!(err.is_engine_fault());
    }
}

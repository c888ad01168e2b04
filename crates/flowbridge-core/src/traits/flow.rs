// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow engine adapter trait for external conversational-flow services.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ContactInfo, FlowReply, FlowSessionId, StartedSession};

/// Adapter for a stateful bot engine holding one session per conversation.
///
/// Implementations translate every transport failure, timeout or malformed
/// body into a [`BridgeError`] for which
/// [`is_engine_fault`](BridgeError::is_engine_fault) holds.
#[async_trait]
pub trait FlowEngineAdapter: PluginAdapter {
    /// Opens a new session for `contact`.
    async fn start_session(&self, contact: &ContactInfo) -> Result<StartedSession, BridgeError>;

    /// Feeds one user message into an existing session.
    async fn continue_session(
        &self,
        session_id: &FlowSessionId,
        message: &str,
    ) -> Result<FlowReply, BridgeError>;
}

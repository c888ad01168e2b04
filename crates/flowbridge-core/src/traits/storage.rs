// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for conversation persistence.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Conversation, ConversationId, ConversationStatus};

/// Persistence of the bridge-owned conversation fields.
///
/// Each write replaces the whole record in one statement, so a reader never
/// observes half of an ownership change.
#[async_trait]
pub trait ConversationStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connections).
    async fn initialize(&self) -> Result<(), BridgeError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), BridgeError>;

    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, BridgeError>;

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), BridgeError>;

    async fn update_conversation(&self, conversation: &Conversation) -> Result<(), BridgeError>;

    /// Lists conversations, optionally filtered by status, most recent first.
    async fn list_conversations(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, BridgeError>;
}

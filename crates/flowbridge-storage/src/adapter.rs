// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`ConversationStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use flowbridge_config::model::StorageConfig;
use flowbridge_core::types::{Conversation, ConversationId, ConversationStatus};
use flowbridge_core::{AdapterType, BridgeError, ConversationStore, HealthStatus, PluginAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed conversation store.
///
/// The database is opened by [`ConversationStore::initialize`]; every other
/// operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, BridgeError> {
        self.db.get().ok_or_else(|| BridgeError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        match self.db.get() {
            Some(db) => db.close().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn initialize(&self) -> Result<(), BridgeError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BridgeError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BridgeError> {
        self.db()?.close().await
    }

    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, BridgeError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), BridgeError> {
        queries::conversations::create_conversation(self.db()?, conversation).await
    }

    async fn update_conversation(&self, conversation: &Conversation) -> Result<(), BridgeError> {
        queries::conversations::update_conversation(self.db()?, conversation).await
    }

    async fn list_conversations(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, BridgeError> {
        queries::conversations::list_conversations(self.db()?, status).await
    }
}

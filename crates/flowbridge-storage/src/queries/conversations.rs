// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation CRUD operations.

use flowbridge_core::BridgeError;
use flowbridge_core::types::{Conversation, ConversationId, ConversationStatus};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{CONVERSATION_COLUMNS, ConversationRow};

/// Insert a new conversation. Fails if the id already exists.
pub async fn create_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), BridgeError> {
    let row = ConversationRow::from(conversation);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO conversations (id, address, integration, session_id, \
                 automation_active, owner_kind, owner_ref, status, ticket_id, company_id, \
                 last_activity_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    row.id,
                    row.address,
                    row.integration,
                    row.session_id,
                    row.automation_active,
                    row.owner_kind,
                    row.owner_ref,
                    row.status,
                    row.ticket_id,
                    row.company_id,
                    row.last_activity_at,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a conversation by id.
pub async fn get_conversation(
    db: &Database,
    id: &ConversationId,
) -> Result<Option<Conversation>, BridgeError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Conversation>, rusqlite::Error> {
            let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1");
            conn.query_row(&sql, params![id], ConversationRow::from_row)
                .optional()?
                .map(ConversationRow::into_conversation)
                .transpose()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite every mutable column of an existing conversation.
///
/// `created_at` is never rewritten. Updating a missing id is a storage error.
pub async fn update_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), BridgeError> {
    let row = ConversationRow::from(conversation);
    let id = row.id.clone();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE conversations SET address = ?2, integration = ?3, session_id = ?4, \
                 automation_active = ?5, owner_kind = ?6, owner_ref = ?7, status = ?8, \
                 ticket_id = ?9, company_id = ?10, last_activity_at = ?11
                 WHERE id = ?1",
                params![
                    row.id,
                    row.address,
                    row.integration,
                    row.session_id,
                    row.automation_active,
                    row.owner_kind,
                    row.owner_ref,
                    row.status,
                    row.ticket_id,
                    row.company_id,
                    row.last_activity_at,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(BridgeError::Storage {
            source: format!("conversation {id} does not exist").into(),
        });
    }
    Ok(())
}

/// List conversations, most recently active first.
pub async fn list_conversations(
    db: &Database,
    status: Option<ConversationStatus>,
) -> Result<Vec<Conversation>, BridgeError> {
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<Conversation>, rusqlite::Error> {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations \
                 WHERE ?1 IS NULL OR status = ?1 \
                 ORDER BY last_activity_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![status], ConversationRow::from_row)?;
            rows.map(|row| row.and_then(ConversationRow::into_conversation))
                .collect()
        })
        .await
        .map_err(map_tr_err)
}

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between the `conversations` table and [`Conversation`].
//!
//! Ownership is stored as a `(owner_kind, owner_ref)` pair and timestamps as
//! RFC 3339 text with microsecond precision.

use chrono::{DateTime, SecondsFormat, Utc};
use flowbridge_core::types::{
    Conversation, ConversationId, ConversationStatus, FlowSessionId, OwnerAssignment, TicketRef,
};
use rusqlite::types::Type;

/// Column list shared by every SELECT, in [`ConversationRow::from_row`] order.
pub const CONVERSATION_COLUMNS: &str = "id, address, integration, session_id, automation_active, \
     owner_kind, owner_ref, status, ticket_id, company_id, last_activity_at, created_at";

/// One `conversations` row in SQL-native types.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRow {
    pub id: String,
    pub address: String,
    pub integration: String,
    pub session_id: Option<String>,
    pub automation_active: bool,
    pub owner_kind: String,
    pub owner_ref: Option<String>,
    pub status: String,
    pub ticket_id: Option<i64>,
    pub company_id: Option<i64>,
    pub last_activity_at: String,
    pub created_at: String,
}

impl ConversationRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            address: row.get(1)?,
            integration: row.get(2)?,
            session_id: row.get(3)?,
            automation_active: row.get(4)?,
            owner_kind: row.get(5)?,
            owner_ref: row.get(6)?,
            status: row.get(7)?,
            ticket_id: row.get(8)?,
            company_id: row.get(9)?,
            last_activity_at: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    /// Decodes the row; malformed status or timestamps fail as conversion errors.
    pub fn into_conversation(self) -> rusqlite::Result<Conversation> {
        let status: ConversationStatus = self
            .status
            .parse()
            .map_err(|e| conversion_error(7, e))?;
        let ticket = match (self.ticket_id, self.company_id) {
            (Some(ticket_id), Some(company_id)) => Some(TicketRef {
                ticket_id,
                company_id,
            }),
            _ => None,
        };

        Ok(Conversation {
            id: ConversationId(self.id),
            address: self.address,
            integration: self.integration,
            session_id: self.session_id.map(FlowSessionId),
            automation_active: self.automation_active,
            owner: OwnerAssignment::from_parts(&self.owner_kind, self.owner_ref),
            status,
            ticket,
            last_activity_at: parse_timestamp(10, &self.last_activity_at)?,
            created_at: parse_timestamp(11, &self.created_at)?,
        })
    }
}

impl From<&Conversation> for ConversationRow {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.0.clone(),
            address: c.address.clone(),
            integration: c.integration.clone(),
            session_id: c.session_id.as_ref().map(|s| s.0.clone()),
            automation_active: c.automation_active,
            owner_kind: c.owner.kind().to_string(),
            owner_ref: c.owner.reference().map(String::from),
            status: c.status.to_string(),
            ticket_id: c.ticket.map(|t| t.ticket_id),
            company_id: c.ticket.map(|t| t.company_id),
            last_activity_at: format_timestamp(&c.last_activity_at),
            created_at: format_timestamp(&c.created_at),
        }
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticketing adapter trait for the helpdesk collaborator.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{TicketRef, TicketUpdate};

/// Adapter for the helpdesk that owns tickets, queues and agents.
#[async_trait]
pub trait TicketingAdapter: PluginAdapter {
    /// Applies a partial update to a ticket.
    ///
    /// Failures are reported as [`BridgeError::Ownership`].
    async fn update_ticket(&self, ticket: TicketRef, update: &TicketUpdate)
        -> Result<(), BridgeError>;
}

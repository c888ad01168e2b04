// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock ticketing adapter recording ticket updates.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use flowbridge_core::BridgeError;
use flowbridge_core::traits::adapter::PluginAdapter;
use flowbridge_core::traits::ticketing::TicketingAdapter;
use flowbridge_core::types::{AdapterType, HealthStatus, TicketRef, TicketUpdate};

pub struct MockTicketing {
    updates: Mutex<Vec<(TicketRef, TicketUpdate)>>,
    fail: AtomicBool,
}

impl MockTicketing {
    pub fn new() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Reject every following update.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Accepted updates, in order.
    pub async fn updates(&self) -> Vec<(TicketRef, TicketUpdate)> {
        self.updates.lock().await.clone()
    }
}

impl Default for MockTicketing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTicketing {
    fn name(&self) -> &str {
        "mock-ticketing"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Ticketing
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait]
impl TicketingAdapter for MockTicketing {
    async fn update_ticket(
        &self,
        ticket: TicketRef,
        update: &TicketUpdate,
    ) -> Result<(), BridgeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::Ownership {
                message: format!("ticket {} rejected the update", ticket.ticket_id),
                source: None,
            });
        }
        self.updates.lock().await.push((ticket, update.clone()));
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpdesk ticketing client.
//!
//! [`HttpTicketing`] applies partial ticket updates with
//! `PUT {base_url}/tickets/{ticket_id}`. Every failure is reported as
//! [`BridgeError::Ownership`].

use std::time::Duration;

use async_trait::async_trait;
use flowbridge_config::model::TicketingConfig;
use flowbridge_core::traits::adapter::PluginAdapter;
use flowbridge_core::traits::ticketing::TicketingAdapter;
use flowbridge_core::types::{AdapterType, HealthStatus, TicketRef, TicketUpdate};
use flowbridge_core::BridgeError;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketUpdateBody<'a> {
    #[serde(flatten)]
    update: &'a TicketUpdate,
    company_id: i64,
}

/// Ticketing collaborator reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTicketing {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpTicketing {
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Internal(format!("failed to build ticketing client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// A client for `config`, or `None` when no base URL is configured.
    pub fn from_config(config: &TicketingConfig) -> Result<Option<Self>, BridgeError> {
        config
            .base_url
            .as_deref()
            .map(|base_url| {
                Self::new(
                    base_url,
                    config.api_token.clone(),
                    Duration::from_secs(config.timeout_secs),
                )
            })
            .transpose()
    }

    pub fn ticket_url(&self, ticket_id: i64) -> String {
        format!("{}/tickets/{ticket_id}", self.base_url)
    }
}

#[async_trait]
impl PluginAdapter for HttpTicketing {
    fn name(&self) -> &str {
        "http-ticketing"
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
impl TicketingAdapter for HttpTicketing {
    async fn update_ticket(
        &self,
        ticket: TicketRef,
        update: &TicketUpdate,
    ) -> Result<(), BridgeError> {
        let body = TicketUpdateBody {
            update,
            company_id: ticket.company_id,
        };
        let mut request = self.client.put(self.ticket_url(ticket.ticket_id)).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| BridgeError::Ownership {
            message: format!("ticket {} update request failed: {e}", ticket.ticket_id),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BridgeError::Ownership {
                message: format!("ticket {} update returned {status}: {text}", ticket.ticket_id),
                source: None,
            });
        }

        tracing::debug!(
            ticket_id = ticket.ticket_id,
            status = %status,
            "ticket updated"
        );
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the FlowBridge session bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level FlowBridge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Process identity and runtime behavior.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway facing the messaging transport.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Helpdesk ticketing collaborator.
    #[serde(default)]
    pub ticketing: TicketingConfig,

    /// Flow engine integrations, one per bot flow.
    #[serde(default)]
    pub integrations: Vec<IntegrationConfig>,
}

impl BridgeConfig {
    /// Looks up an integration by name.
    pub fn integration(&self, name: &str) -> Option<&IntegrationConfig> {
        self.integrations.iter().find(|i| i.name == name)
    }
}

/// Process identity and runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of this bridge instance.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds to wait for in-flight messages on shutdown.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_agent_name() -> String {
    "flowbridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_drain_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("flowbridge").join("flowbridge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("flowbridge.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
///
/// Inbound transport events arrive on the gateway; outbound messages and
/// presence updates are posted to `outbound_url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Enable the gateway.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on inbound requests.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Transport endpoint receiving outbound messages and presence updates.
    #[serde(default)]
    pub outbound_url: Option<String>,

    /// Bearer token sent with outbound requests.
    #[serde(default)]
    pub outbound_bearer_token: Option<String>,

    /// Timeout for outbound requests in seconds.
    #[serde(default = "default_outbound_timeout_secs")]
    pub outbound_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
            outbound_url: None,
            outbound_bearer_token: None,
            outbound_timeout_secs: default_outbound_timeout_secs(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3080
}

fn default_outbound_timeout_secs() -> u64 {
    15
}

/// Helpdesk ticketing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TicketingConfig {
    /// Base URL of the helpdesk API. `None` keeps ownership changes local.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the helpdesk API.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_ticketing_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            timeout_secs: default_ticketing_timeout_secs(),
        }
    }
}

fn default_ticketing_timeout_secs() -> u64 {
    10
}

/// One flow engine integration (a Typebot flow).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Unique integration name, referenced by inbound events.
    pub name: String,

    /// Integration id reported to the helpdesk.
    #[serde(default)]
    pub integration_id: Option<i64>,

    /// Base URL of the flow engine, e.g. `https://typebot.example.com`.
    pub base_url: String,

    /// Public identifier of the flow.
    pub flow_slug: String,

    /// Idle minutes after which a session is restarted; 0 disables expiry.
    #[serde(default)]
    pub session_expiry_minutes: u64,

    /// Message body that restarts the flow.
    #[serde(default)]
    pub keyword_restart: String,

    /// Message body that closes the conversation.
    #[serde(default)]
    pub keyword_finish: String,

    /// Text sent when the flow engine did not understand the user.
    #[serde(default = "default_unknown_reply_text")]
    pub unknown_reply_text: String,

    /// Delay between the typing indicator and each message, in milliseconds.
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,

    /// Text confirming a restart.
    #[serde(default = "default_restart_reply_text")]
    pub restart_reply_text: String,

    /// Flow engine request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Send `unknown_reply_text` when a reply has neither messages nor a prompt.
    #[serde(default = "default_fallback_on_empty")]
    pub fallback_on_empty: bool,
}

impl IntegrationConfig {
    /// A minimal integration with defaults for every optional field.
    pub fn new(name: &str, base_url: &str, flow_slug: &str) -> Self {
        Self {
            name: name.to_string(),
            integration_id: None,
            base_url: base_url.to_string(),
            flow_slug: flow_slug.to_string(),
            session_expiry_minutes: 0,
            keyword_restart: String::new(),
            keyword_finish: String::new(),
            unknown_reply_text: default_unknown_reply_text(),
            message_delay_ms: default_message_delay_ms(),
            restart_reply_text: default_restart_reply_text(),
            request_timeout_secs: default_request_timeout_secs(),
            fallback_on_empty: default_fallback_on_empty(),
        }
    }

    pub fn session_expiry(&self) -> Duration {
        Duration::from_secs(self.session_expiry_minutes.saturating_mul(60))
    }

    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_unknown_reply_text() -> String {
    "Sorry, I did not understand. Please try again.".to_string()
}

fn default_message_delay_ms() -> u64 {
    1000
}

fn default_restart_reply_text() -> String {
    "Conversation restarted.".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_fallback_on_empty() -> bool {
    true
}

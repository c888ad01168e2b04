// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the FlowBridge session bridge.

use thiserror::Error;

/// The primary error type used across all FlowBridge adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging transport errors (disconnects, rejected sends).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The channel will deliver no more inbound messages.
    #[error("channel closed")]
    ChannelClosed,

    /// Flow engine errors (network failure, non-2xx status).
    #[error("flow engine error: {message}")]
    FlowEngine {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The flow engine answered with a body that is missing expected fields.
    #[error("malformed upstream payload: {message}")]
    MalformedPayload { message: String },

    /// The ticketing collaborator rejected an ownership change.
    #[error("ownership update failed: {message}")]
    Ownership {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Requested adapter was not found in the registry.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Returns true for failures of the flow engine round-trip.
    ///
    /// These reset the conversation's session handle and abandon the current
    /// dispatch batch; they are never surfaced to the end user.
    pub fn is_engine_fault(&self) -> bool {
        matches!(
            self,
            BridgeError::FlowEngine { .. }
                | BridgeError::Timeout { .. }
                | BridgeError::MalformedPayload { .. }
        )
    }
}

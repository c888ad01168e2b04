// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the FlowBridge session bridge.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by the workspace: conversations and their ownership, flow engine
//! reply units, transport messages, and ticket updates. Every adapter
//! (channel, flow engine, storage, ticketing) implements a trait defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::BridgeError;
pub use types::{
    AdapterType, Conversation, ConversationId, ConversationStatus, FlowSessionId, HealthStatus,
    MessageId, OwnerAssignment,
};

pub use traits::{
    ChannelAdapter, ConversationStore, FlowEngineAdapter, PluginAdapter, TicketingAdapter,
};

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod flow;
pub mod storage;
pub mod ticketing;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use flow::FlowEngineAdapter;
pub use storage::ConversationStore;
pub use ticketing::TicketingAdapter;

// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for FlowBridge integration tests.
//!
//! Provides mock adapters and a harness for fast, deterministic tests
//! without a messaging transport, flow engine or helpdesk.
//!
//! # Components
//!
//! - [`MockChannel`] - channel with message injection and an ordered event log
//! - [`MockFlowEngine`] - flow engine with scripted replies and call records
//! - [`MockTicketing`] - ticketing collaborator recording ticket updates
//! - [`TestHarness`] - temp SQLite store wired into a [`flowbridge_agent::BridgeService`]

pub mod harness;
pub mod mock_channel;
pub mod mock_engine;
pub mod mock_ticketing;

pub use harness::TestHarness;
pub use mock_channel::{ChannelEvent, MockChannel};
pub use mock_engine::MockFlowEngine;
pub use mock_ticketing::MockTicketing;

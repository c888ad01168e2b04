// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the FlowBridge session bridge.
//!
//! WAL-mode SQLite with embedded migrations. All writes go through one
//! `tokio-rusqlite` background thread, so conversation rows are updated by a
//! single writer.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;

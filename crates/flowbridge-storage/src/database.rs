// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Migrations run on a short-lived blocking connection; afterwards every
//! query goes through the single `tokio-rusqlite` connection held here.

use std::path::Path;

use flowbridge_core::BridgeError;
use tracing::{debug, info};

use crate::migrations;

/// Handle to the bridge database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and applies migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, BridgeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| BridgeError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.to_string();
        let applied = tokio::task::spawn_blocking(move || -> Result<usize, BridgeError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| BridgeError::Storage {
                    source: Box::new(e),
                })?;
            conn.execute_batch(&pragmas(wal_mode))
                .map_err(|e| BridgeError::Storage {
                    source: Box::new(e),
                })?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| BridgeError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| BridgeError::Storage {
                source: Box::new(e),
            })?;
        let batch = pragmas(wal_mode);
        conn.call(move |c| -> Result<(), rusqlite::Error> { c.execute_batch(&batch) })
            .await
            .map_err(map_tr_err)?;

        info!(path, applied, wal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main database file is complete.
    pub async fn close(&self) -> Result<(), BridgeError> {
        self.conn
            .call(|c| -> Result<(), rusqlite::Error> {
                c.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

fn pragmas(wal_mode: bool) -> String {
    let journal = if wal_mode { "WAL" } else { "DELETE" };
    format!(
        "PRAGMA journal_mode = {journal};
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;"
    )
}

/// Convert a tokio-rusqlite error into [`BridgeError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> BridgeError {
    BridgeError::Storage {
        source: Box::new(e),
    }
}

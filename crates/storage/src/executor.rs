// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async SQLite executor, a single dedicated background thread.
//!
//! Grounded on the pack's `daemon-database::AsyncDatabase`: SQLite already
//! serializes writers, so one thread is optimal; callers `.await` a
//! `call()` that runs on that thread, keeping the Tokio runtime free.
//!
//! **Only SQL belongs inside `call()`.** No crypto, no mutexes, no file
//! I/O beyond what rusqlite itself performs — anything else starves every
//! other pending query.

use crate::error::{from_tokio_rusqlite, StorageResult};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::info;

#[derive(Clone)]
pub struct AsyncConnection {
    conn: Connection,
}

impl AsyncConnection {
    pub async fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, "opening storage database");

        let conn = Connection::open(&path_str)
            .await
            .map_err(|e| crate::error::StorageError::Connection(e.to_string()))?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 30000;",
            )?;
            Ok(())
        })
        .await
        .map_err(from_tokio_rusqlite)?;

        conn.call(|conn| {
            crate::migrations::run_migrations(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(e.to_string()))))?;
            Ok(())
        })
        .await
        .map_err(from_tokio_rusqlite)?;

        info!(path = %path_str, "storage database ready");
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| crate::error::StorageError::Connection(e.to_string()))?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            crate::migrations::run_migrations(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(e.to_string()))))?;
            Ok(())
        })
        .await
        .map_err(from_tokio_rusqlite)?;
        Ok(Self { conn })
    }

    /// Run `f` on the executor thread. Only SQL belongs here.
    pub async fn call<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let outer = self.conn.call(move |conn| Ok(f(conn))).await;
        match outer {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The connection's `busy_timeout` pragma (30s) elapsed
    /// without acquiring the lock.
    #[error("storage busy: lock not acquired within timeout")]
    Busy,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

pub(crate) fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> StorageError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) if is_busy(&e) => StorageError::Busy,
        tokio_rusqlite::Error::Rusqlite(e) => StorageError::Sqlite(e),
        tokio_rusqlite::Error::Close(_) => {
            StorageError::Connection("connection closed".to_string())
        }
        other => StorageError::Connection(other.to_string()),
    }
}

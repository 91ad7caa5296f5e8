// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable session store and config mirror.
//!
//! All operations are `async fn` dispatched onto [`AsyncConnection`]'s
//! single executor thread, so callers never block the Tokio runtime —
//! directly grounded on the pack's `AsyncDatabase::call` design.

use crate::error::StorageResult;
use crate::executor::AsyncConnection;
use chrono::{DateTime, Utc};
use guardian_core::{Session, SessionId, Username};
use rusqlite::{params, OptionalExtension};
use std::path::Path;

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

/// Durable store for sessions and a mirror of selected configuration
/// values, so administrators may audit what the daemon last accepted.
#[derive(Clone)]
pub struct Storage {
    conn: AsyncConnection,
}

impl Storage {
    /// Opens (creating if absent) and migrates the database at `path`.
    pub async fn open_or_create(path: &Path) -> StorageResult<Self> {
        let conn = AsyncConnection::open(path).await?;
        Ok(Self { conn })
    }

    #[cfg(any(test, feature = "test-support"))]
    pub async fn open_in_memory_for_tests() -> StorageResult<Self> {
        Ok(Self {
            conn: AsyncConnection::open_in_memory().await?,
        })
    }

    /// Idempotent on `(username, session_id, start_wall)`.
    pub async fn insert_session(&self, session: &Session) -> StorageResult<()> {
        let id = session.id.as_str().to_string();
        let username = session.username.as_str().to_string();
        let start = to_millis(session.start_wall);
        let last_update = start;

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (id, username, start_wall, end_wall, accumulated_seconds, last_update_wall)
                     VALUES (?1, ?2, ?3, NULL, 0, ?4)
                     ON CONFLICT(id, start_wall) DO NOTHING",
                    params![id, username, start, last_update],
                )?;
                Ok(())
            })
            .await
    }

    /// Atomic with respect to any concurrent read of the same row
    /// (single-writer executor thread serializes all calls).
    pub async fn update_session_progress(
        &self,
        session_id: &SessionId,
        accumulated_seconds: f64,
        last_update_wall: DateTime<Utc>,
    ) -> StorageResult<()> {
        let id = session_id.as_str().to_string();
        let last_update = to_millis(last_update_wall);

        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE sessions SET accumulated_seconds = ?1, last_update_wall = ?2
                     WHERE id = ?3 AND end_wall IS NULL",
                    params![accumulated_seconds, last_update, id],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn close_session(
        &self,
        session_id: &SessionId,
        end_wall: DateTime<Utc>,
        accumulated_seconds: f64,
    ) -> StorageResult<()> {
        let id = session_id.as_str().to_string();
        let end = to_millis(end_wall);

        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE sessions SET end_wall = ?1, accumulated_seconds = ?2, last_update_wall = ?1
                     WHERE id = ?3 AND end_wall IS NULL",
                    params![end, accumulated_seconds, id],
                )?;
                Ok(())
            })
            .await
    }

    /// Used on startup to restore open sessions into SessionTracker.
    pub async fn list_open_sessions(&self) -> StorageResult<Vec<Session>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, start_wall, end_wall, accumulated_seconds
                     FROM sessions WHERE end_wall IS NULL",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        let id: String = row.get(0)?;
                        let username: String = row.get(1)?;
                        let start_wall: i64 = row.get(2)?;
                        let end_wall: Option<i64> = row.get(3)?;
                        let accumulated_seconds: f64 = row.get(4)?;
                        Ok((id, username, start_wall, end_wall, accumulated_seconds))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut sessions = Vec::with_capacity(rows.len());
                for (id, username, start_wall, end_wall, accumulated_seconds) in rows {
                    let username = Username::parse(username).map_err(|e| {
                        rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(
                            e.to_string(),
                        )))
                    })?;
                    sessions.push(Session {
                        id: SessionId::new(id),
                        username,
                        start_wall: from_millis(start_wall),
                        end_wall: end_wall.map(from_millis),
                        accumulated_seconds,
                    });
                }
                Ok(sessions)
            })
            .await
    }

    /// `Σ overlap(session, [since_wall, until_wall))` over all stored
    /// sessions for `username`, using the `(username, start_wall)` index.
    /// Open sessions (`end_wall IS NULL`) are treated as open through
    /// `until_wall`.
    pub async fn sum_usage(
        &self,
        username: &Username,
        since_wall: DateTime<Utc>,
        until_wall: DateTime<Utc>,
    ) -> StorageResult<f64> {
        let username = username.as_str().to_string();
        let since = to_millis(since_wall);
        let until = to_millis(until_wall);

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT start_wall, end_wall, accumulated_seconds FROM sessions
                     WHERE username = ?1 AND start_wall < ?3
                       AND (end_wall IS NULL OR end_wall > ?2)",
                )?;
                let rows = stmt
                    .query_map(params![username, since, until], |row| {
                        let start: i64 = row.get(0)?;
                        let end: Option<i64> = row.get(1)?;
                        let accumulated: f64 = row.get(2)?;
                        Ok((start, end, accumulated))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut total = 0.0;
                for (start, end, accumulated) in rows {
                    let session_start = start.max(since);
                    let session_end = end.map(|e| e.min(until)).unwrap_or(until);
                    if session_end <= session_start {
                        continue;
                    }
                    let span_ms = (end.unwrap_or(until) - start).max(1) as f64;
                    let overlap_ms = (session_end - session_start) as f64;
                    total += accumulated * (overlap_ms / span_ms);
                }
                Ok(total)
            })
            .await
    }

    /// Single-transaction upsert of the mirrored configuration view, so a
    /// partial failure never leaves a half-mirrored snapshot.
    pub async fn sync_config(&self, entries: Vec<(String, String)>) -> StorageResult<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.unchecked_transaction()?;
                tx.execute("DELETE FROM config_mirror", [])?;
                for (key, value) in &entries {
                    tx.execute(
                        "INSERT INTO config_mirror (key, value) VALUES (?1, ?2)",
                        params![key, value],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    pub async fn record_bonus(
        &self,
        username: &Username,
        day_start_wall: DateTime<Utc>,
        seconds: u32,
    ) -> StorageResult<()> {
        let username = username.as_str().to_string();
        let day_start = to_millis(day_start_wall);

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO bonuses (username, day_start_wall, seconds) VALUES (?1, ?2, ?3)
                     ON CONFLICT(username, day_start_wall) DO UPDATE SET seconds = seconds + ?3",
                    params![username, day_start, seconds],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn bonus_seconds(
        &self,
        username: &Username,
        day_start_wall: DateTime<Utc>,
    ) -> StorageResult<u32> {
        let username = username.as_str().to_string();
        let day_start = to_millis(day_start_wall);

        self.conn
            .call(move |conn| {
                let seconds: Option<i64> = conn
                    .query_row(
                        "SELECT seconds FROM bonuses WHERE username = ?1 AND day_start_wall = ?2",
                        params![username, day_start],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(seconds.unwrap_or(0) as u32)
            })
            .await
    }

    /// The wall-clock instant of the last UsageDay reset the daemon
    /// recorded, if any — used at startup to detect a reset missed while
    /// the daemon (or the machine) was down.
    pub async fn last_reset_wall(&self) -> StorageResult<Option<DateTime<Utc>>> {
        self.conn
            .call(|conn| {
                let ms: Option<i64> = conn
                    .query_row("SELECT last_reset_wall FROM meta LIMIT 1", [], |row| {
                        row.get(0)
                    })
                    .optional()?
                    .flatten();
                Ok(ms.map(from_millis))
            })
            .await
    }

    /// Records `at` as the last UsageDay reset instant, upserting the
    /// single `meta` row (creating it with `schema_version = 1` if the
    /// migration's seed row is somehow absent).
    pub async fn record_reset(&self, at: DateTime<Utc>) -> StorageResult<()> {
        let ms = to_millis(at);
        self.conn
            .call(move |conn| {
                let changed = conn.execute("UPDATE meta SET last_reset_wall = ?1", params![ms])?;
                if changed == 0 {
                    conn.execute(
                        "INSERT INTO meta (schema_version, last_reset_wall) VALUES (1, ?1)",
                        params![ms],
                    )?;
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

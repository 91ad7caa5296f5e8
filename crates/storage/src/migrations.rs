// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrations, applied inside a single transaction on open.
//!
//! Shape follows the pack's `daemon-database` migrations module: a
//! `migrations` tracking table plus one `migrate_vN_*` function per
//! version, each gated by `if current_version < N`.

use crate::error::StorageResult;
use rusqlite::Connection;
use tracing::{debug, info};

pub const CURRENT_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    info!(current_version, target_version = CURRENT_VERSION, "running storage migrations");

    if current_version < 1 {
        migrate_v1_initial_schema(conn)?;
    }

    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "storage migration applied");
    Ok(())
}

/// V1: sessions, bonuses, config_mirror, meta.
fn migrate_v1_initial_schema(conn: &Connection) -> StorageResult<()> {
    info!("applying storage migration v1: initial schema");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT NOT NULL,
            username TEXT NOT NULL,
            start_wall INTEGER NOT NULL,
            end_wall INTEGER,
            accumulated_seconds REAL NOT NULL DEFAULT 0,
            last_update_wall INTEGER NOT NULL,
            PRIMARY KEY (id, start_wall)
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_username_start
            ON sessions(username, start_wall);

        CREATE TABLE IF NOT EXISTS bonuses (
            username TEXT NOT NULL,
            day_start_wall INTEGER NOT NULL,
            seconds INTEGER NOT NULL,
            PRIMARY KEY (username, day_start_wall)
        );

        CREATE TABLE IF NOT EXISTS config_mirror (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meta (
            schema_version INTEGER NOT NULL,
            last_reset_wall INTEGER
        );
        ",
    )?;

    record_migration(conn, 1, "initial_schema")?;
    Ok(())
}

#[cfg(test)]
#[path = "migrations_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn run_migrations_creates_expected_tables() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();

    let tables: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();

    for expected in ["sessions", "bonuses", "config_mirror", "meta", "migrations"] {
        assert!(tables.contains(&expected.to_string()), "missing table {expected}");
    }
}

#[test]
fn run_migrations_is_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();

    let version: i32 = conn
        .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, CURRENT_VERSION);
}

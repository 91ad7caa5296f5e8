// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and the durable/in-memory session record.
//!
//! A `Session` is opened by SessionTracker on a `NewSession` event for a
//! managed user and closed on `RemovedSession` or daemon shutdown. Ownership
//! is exclusive to SessionTracker in memory and mirrored in Storage.

use crate::username::Username;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

crate::define_id! {
    /// Opaque session identifier, as handed to us by LoginSource.
    pub struct SessionId;
}

/// A `[start, end)` interval of monotonic time during which a session was
/// screen-locked and therefore not accumulating usage. `end = None` means
/// the lock is still open.
#[derive(Debug, Clone, Copy)]
pub struct LockedInterval {
    pub start_monotonic: Instant,
    pub end_monotonic: Option<Instant>,
}

impl LockedInterval {
    pub fn is_open(&self) -> bool {
        self.end_monotonic.is_none()
    }
}

/// Durable session record, as mirrored into Storage.
///
/// `locked_intervals` is tracked only in the in-memory `SessionRuntime`
/// (guardian-engine) since `Instant` has no wall-clock representation worth
/// persisting; what Storage keeps is the resulting `accumulated_seconds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub username: Username,
    pub start_wall: DateTime<Utc>,
    pub end_wall: Option<DateTime<Utc>>,
    pub accumulated_seconds: f64,
}

impl Session {
    pub fn new(id: SessionId, username: Username, start_wall: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            start_wall,
            end_wall: None,
            accumulated_seconds: 0.0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_wall.is_none()
    }

    /// Closes the session at `at`, recording final `accumulated_seconds`.
    ///
    /// No-op if already closed; callers enforce the "at most one open
    /// session per id" invariant at the tracker level.
    pub fn close(&mut self, at: DateTime<Utc>, accumulated_seconds: f64) {
        if self.end_wall.is_none() {
            self.end_wall = Some(at);
            self.accumulated_seconds = accumulated_seconds;
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single event vocabulary LoginSource, ConfigLoader, AdminIpc, and the
//! daemon's timer tick all speak, threaded through SessionTracker and
//! Enforcer. Mirrors the teacher's single `Event` enum shared across every
//! subsystem.

use crate::session::SessionId;
use crate::username::Username;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A session snapshot as reported by `LoginSource::resync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub username: Username,
    pub start_wall: DateTime<Utc>,
    pub locked: bool,
}

/// Events flowing into SessionTracker and Enforcer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A login session started for a managed user.
    NewSession {
        id: SessionId,
        username: Username,
        start_wall: DateTime<Utc>,
    },
    /// A login session ended.
    RemovedSession { id: SessionId, at: DateTime<Utc> },
    /// The session's screen locked; usage accumulation pauses.
    Locked { id: SessionId, at: DateTime<Utc> },
    /// The session's screen unlocked; usage accumulation resumes.
    Unlocked { id: SessionId, at: DateTime<Utc> },
    /// LoginSource reconnected and reports the authoritative session list.
    Resync { sessions: Vec<SessionSnapshot> },
    /// A UsageDay boundary was crossed.
    DayRolledOver { at: DateTime<Utc> },
    /// ConfigLoader published a new Policy snapshot.
    ConfigReloaded,
    /// An administrator granted extra seconds to a user for the current day.
    BonusGranted { username: Username, seconds: u32 },
    /// Daemon shutdown requested; components should finalize durable state.
    Shutdown,
}

impl Event {
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Event::NewSession { id, .. }
            | Event::RemovedSession { id, .. }
            | Event::Locked { id, .. }
            | Event::Unlocked { id, .. } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

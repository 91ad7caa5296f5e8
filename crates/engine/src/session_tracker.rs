// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintains active sessions, lock intervals, and accumulated usage for
//! every managed user; restores from storage on boot.
//!
//! The tracker holds one `tokio::sync::Mutex` over all of its mutable
//! state. A plain `parking_lot::Mutex` would be cheaper for the
//! lock/unlock/tick paths, but recovery and the periodic flush must hold
//! the lock across a storage write so that a concurrent read never
//! observes a half-updated session — that requires an async-aware guard.

use chrono::{DateTime, Utc};
use guardian_core::{Clock, Event, Session, SessionId, SessionSnapshot, UsageDay, Username};
use guardian_storage::Storage;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::EngineResult;

/// Flush to storage once a session's unflushed delta reaches this many
/// seconds, in addition to flushing on every lock/unlock/close.
pub const FLUSH_THRESHOLD_SECONDS: f64 = 15.0;

/// Default tick cadence driving usage accumulation between events.
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

/// Recovery never backdates a session's close further than this past its
/// last recorded update.
const RECOVERY_GRACE: chrono::Duration = chrono::Duration::seconds(60);

/// In-memory state for one currently-open session.
#[derive(Debug, Clone)]
struct SessionRuntime {
    username: Username,
    start_wall: DateTime<Utc>,
    locked_since_monotonic: Option<Instant>,
    last_tick_monotonic: Instant,
    /// Total accumulated seconds for the lifetime of the session, mirrored
    /// to `sessions.accumulated_seconds`.
    lifetime_seconds: f64,
    /// `lifetime_seconds` as of the last successful storage flush.
    flushed_seconds: f64,
    /// Seconds accrued since the start of the current UsageDay — reset to
    /// zero at day rollover without closing the session.
    today_seconds: f64,
}

struct TrackerState {
    active: HashMap<SessionId, SessionRuntime>,
    /// Per-user seconds contributed by sessions already closed (and
    /// therefore durable) within the current UsageDay. Active sessions'
    /// `today_seconds` is added on top of this at read time.
    closed_baseline: HashMap<Username, f64>,
    current_day: Option<UsageDay>,
}

/// Read-only snapshot of one user's standing, handed to Enforcer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserUsage {
    pub used_seconds: f64,
}

pub struct SessionTracker<C: Clock> {
    clock: C,
    storage: Storage,
    state: Mutex<TrackerState>,
}

impl<C: Clock> SessionTracker<C> {
    pub fn new(clock: C, storage: Storage) -> Self {
        Self {
            clock,
            storage,
            state: Mutex::new(TrackerState {
                active: HashMap::new(),
                closed_baseline: HashMap::new(),
                current_day: None,
            }),
        }
    }

    /// Restores open sessions from storage and reconciles them against a
    /// `Resync` snapshot from LoginSource, per the restart-recovery
    /// algorithm: storage sessions missing from the resync are closed with
    /// a bounded grace heuristic; resync sessions missing from storage are
    /// opened fresh.
    pub async fn recover(&self, resync: &[SessionSnapshot], reset_time: chrono::NaiveTime, tz: chrono_tz::Tz) -> EngineResult<()> {
        let stored = self.storage.list_open_sessions().await?;
        let now_wall = self.clock.now_wall();
        let now_monotonic = self.clock.now_monotonic();
        let day = UsageDay::containing(now_wall, reset_time, tz);

        let resync_by_id: HashMap<&SessionId, &SessionSnapshot> =
            resync.iter().map(|s| (&s.id, s)).collect();

        let mut state = self.state.lock().await;
        state.current_day = Some(day);

        for session in &stored {
            match resync_by_id.get(&session.id) {
                Some(snapshot) => {
                    let runtime = SessionRuntime {
                        username: session.username.clone(),
                        start_wall: session.start_wall,
                        locked_since_monotonic: if snapshot.locked {
                            Some(now_monotonic)
                        } else {
                            None
                        },
                        last_tick_monotonic: now_monotonic,
                        lifetime_seconds: session.accumulated_seconds,
                        flushed_seconds: session.accumulated_seconds,
                        today_seconds: day.overlap_seconds(session.start_wall, None, now_wall),
                    };
                    state
                        .closed_baseline
                        .entry(session.username.clone())
                        .or_insert(0.0);
                    state.active.insert(session.id.clone(), runtime);
                }
                None => {
                    // Gone by the time we reconnected: close it with a
                    // bounded heuristic rather than leaving it open forever.
                    let end_wall = (session.start_wall
                        + chrono::Duration::seconds(session.accumulated_seconds as i64)
                        + RECOVERY_GRACE)
                        .min(now_wall);
                    self.storage
                        .close_session(&session.id, end_wall, session.accumulated_seconds)
                        .await?;
                    let contribution = day.overlap_seconds(session.start_wall, Some(end_wall), now_wall);
                    *state
                        .closed_baseline
                        .entry(session.username.clone())
                        .or_insert(0.0) += contribution;
                }
            }
        }

        for snapshot in resync {
            if state.active.contains_key(&snapshot.id) {
                continue;
            }
            let session = Session::new(snapshot.id.clone(), snapshot.username.clone(), now_wall);
            self.storage.insert_session(&session).await?;
            state.active.insert(
                snapshot.id.clone(),
                SessionRuntime {
                    username: snapshot.username.clone(),
                    start_wall: now_wall,
                    locked_since_monotonic: if snapshot.locked {
                        Some(now_monotonic)
                    } else {
                        None
                    },
                    last_tick_monotonic: now_monotonic,
                    lifetime_seconds: 0.0,
                    flushed_seconds: 0.0,
                    today_seconds: 0.0,
                },
            );
            state
                .closed_baseline
                .entry(snapshot.username.clone())
                .or_insert(0.0);
        }

        Ok(())
    }

    /// Applies one LoginSource event. `reset_time`/`tz` are needed only for
    /// `Resync` (a reconnect mid-run re-runs recovery) and `DayRolledOver`.
    pub async fn handle_event(
        &self,
        event: Event,
        reset_time: chrono::NaiveTime,
        tz: chrono_tz::Tz,
    ) -> EngineResult<()> {
        match event {
            Event::NewSession {
                id,
                username,
                start_wall,
            } => {
                let now_monotonic = self.clock.now_monotonic();
                let session = Session::new(id.clone(), username.clone(), start_wall);
                self.storage.insert_session(&session).await?;
                let mut state = self.state.lock().await;
                state.active.insert(
                    id,
                    SessionRuntime {
                        username: username.clone(),
                        start_wall,
                        locked_since_monotonic: None,
                        last_tick_monotonic: now_monotonic,
                        lifetime_seconds: 0.0,
                        flushed_seconds: 0.0,
                        today_seconds: 0.0,
                    },
                );
                state.closed_baseline.entry(username).or_insert(0.0);
            }
            Event::RemovedSession { id, at } => {
                self.close_one(&id, at).await?;
            }
            Event::Locked { id, at: _ } => {
                let now_monotonic = self.clock.now_monotonic();
                let mut state = self.state.lock().await;
                if let Some(runtime) = state.active.get_mut(&id) {
                    if runtime.locked_since_monotonic.is_some() {
                        tracing::warn!(session_id = %id.as_str(), "Locked event for already-locked session, ignoring");
                    } else {
                        tick_one(runtime, now_monotonic);
                        runtime.locked_since_monotonic = Some(now_monotonic);
                    }
                }
            }
            Event::Unlocked { id, at: _ } => {
                let now_monotonic = self.clock.now_monotonic();
                let mut state = self.state.lock().await;
                if let Some(runtime) = state.active.get_mut(&id) {
                    if runtime.locked_since_monotonic.take().is_none() {
                        tracing::warn!(session_id = %id.as_str(), "Unlocked event for already-unlocked session, ignoring");
                    }
                    runtime.last_tick_monotonic = now_monotonic;
                }
            }
            Event::Resync { sessions } => {
                self.recover(&sessions, reset_time, tz).await?;
            }
            Event::DayRolledOver { at: _ } => {
                self.roll_day(reset_time, tz).await;
            }
            _ => {}
        }
        self.flush_due(FLUSH_THRESHOLD_SECONDS).await?;
        Ok(())
    }

    /// Advances every unlocked session's accumulated usage, then flushes
    /// sessions whose unflushed delta has crossed `FLUSH_THRESHOLD_SECONDS`.
    /// Called at `TICK_INTERVAL` cadence by the supervisor's main loop.
    pub async fn tick(&self) -> EngineResult<()> {
        let now_monotonic = self.clock.now_monotonic();
        {
            let mut state = self.state.lock().await;
            for runtime in state.active.values_mut() {
                tick_one(runtime, now_monotonic);
            }
        }
        self.flush_due(FLUSH_THRESHOLD_SECONDS).await
    }

    async fn flush_due(&self, threshold: f64) -> EngineResult<()> {
        let to_flush: Vec<(SessionId, f64)> = {
            let state = self.state.lock().await;
            state
                .active
                .iter()
                .filter(|(_, r)| r.lifetime_seconds - r.flushed_seconds >= threshold)
                .map(|(id, r)| (id.clone(), r.lifetime_seconds))
                .collect()
        };
        for (id, seconds) in to_flush {
            let now_wall = self.clock.now_wall();
            self.storage.update_session_progress(&id, seconds, now_wall).await?;
            let mut state = self.state.lock().await;
            if let Some(runtime) = state.active.get_mut(&id) {
                runtime.flushed_seconds = seconds;
            }
        }
        Ok(())
    }

    async fn close_one(&self, id: &SessionId, at: DateTime<Utc>) -> EngineResult<()> {
        let now_monotonic = self.clock.now_monotonic();
        let mut state = self.state.lock().await;
        let Some(mut runtime) = state.active.remove(id) else {
            return Ok(());
        };
        tick_one(&mut runtime, now_monotonic);
        *state
            .closed_baseline
            .entry(runtime.username.clone())
            .or_insert(0.0) += runtime.today_seconds;
        drop(state);
        self.storage.close_session(id, at, runtime.lifetime_seconds).await
    }

    /// Rolls every user's `today_seconds` baseline over to a fresh UsageDay,
    /// without closing active sessions — their contribution to the new day
    /// starts counting from this instant.
    async fn roll_day(&self, reset_time: chrono::NaiveTime, tz: chrono_tz::Tz) {
        let now_wall = self.clock.now_wall();
        let day = UsageDay::containing(now_wall, reset_time, tz);
        let mut state = self.state.lock().await;
        state.current_day = Some(day);
        state.closed_baseline.clear();
        for runtime in state.active.values_mut() {
            runtime.today_seconds = 0.0;
        }
    }

    /// `used_seconds` for `username` within the current UsageDay.
    pub async fn used_seconds(&self, username: &str) -> f64 {
        let state = self.state.lock().await;
        let active: f64 = state
            .active
            .values()
            .filter(|r| r.username.as_str() == username)
            .map(|r| r.today_seconds)
            .sum();
        active + state.closed_baseline.get(username).copied().unwrap_or(0.0)
    }

    /// `max(0, quota - used)` for `username`.
    pub async fn remaining_seconds(&self, username: &str, daily_quota_seconds: u32) -> f64 {
        let used = self.used_seconds(username).await;
        (daily_quota_seconds as f64 - used).max(0.0)
    }

    pub async fn active_managed_users(&self) -> Vec<Username> {
        let state = self.state.lock().await;
        let mut users: Vec<Username> = state.active.values().map(|r| r.username.clone()).collect();
        users.sort();
        users.dedup();
        users
    }

    pub async fn sessions_of(&self, username: &str) -> Vec<SessionId> {
        let state = self.state.lock().await;
        state
            .active
            .iter()
            .filter(|(_, r)| r.username.as_str() == username)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Flushes every active session's current total to storage. Called by
    /// the supervisor on shutdown, best-effort.
    pub async fn flush_all(&self) -> EngineResult<()> {
        self.flush_due(0.0).await
    }
}

fn tick_one(runtime: &mut SessionRuntime, now_monotonic: Instant) {
    if runtime.locked_since_monotonic.is_none() {
        let elapsed = now_monotonic
            .saturating_duration_since(runtime.last_tick_monotonic)
            .as_secs_f64();
        runtime.lifetime_seconds += elapsed;
        runtime.today_seconds += elapsed;
    }
    runtime.last_tick_monotonic = now_monotonic;
}

#[cfg(test)]
#[path = "session_tracker_tests.rs"]
mod tests;

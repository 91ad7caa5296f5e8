// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user enforcement state machine data model.
//!
//! The state shape lives here so guardian-engine's `Enforcer` and
//! guardian-daemon's status/IPC surface can share one definition without a
//! circular crate dependency. The transition table itself (handlers for
//! each phase) lives in guardian-engine, split one file per concern the way
//! the teacher splits its runtime handlers by owner kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle phase of enforcement for one user within one UsageDay.
///
/// Transitions are monotonic within a day; `DayRolledOver`
/// resets every phase back to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Normal,
    Warning,
    Grace,
    Terminating,
    Terminated,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Normal
    }
}

/// In-memory enforcement state for one managed user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementState {
    pub phase: Phase,
    /// Warning thresholds (minutes) already notified this UsageDay.
    pub notified_thresholds: BTreeSet<u16>,
    pub grace_started_at: Option<DateTime<Utc>>,
    pub last_grace_tick_at: Option<DateTime<Utc>>,
}

impl Default for EnforcementState {
    fn default() -> Self {
        Self {
            phase: Phase::Normal,
            notified_thresholds: BTreeSet::new(),
            grace_started_at: None,
            last_grace_tick_at: None,
        }
    }
}

impl EnforcementState {
    /// Reset to `Normal` at a UsageDay boundary.
    pub fn reset_for_new_day(&mut self) {
        self.phase = Phase::Normal;
        self.notified_thresholds.clear();
        self.grace_started_at = None;
        self.last_grace_tick_at = None;
    }

    /// The smallest unnotified threshold that `remaining_minutes` has
    /// crossed, if any (tie-break rule: most urgent wins,
    /// all others crossed in the same tick are marked sent without a
    /// separate notification).
    pub fn next_unnotified_threshold(&self, remaining_minutes: u16, thresholds: &[u16]) -> Option<u16> {
        thresholds
            .iter()
            .copied()
            .filter(|t| remaining_minutes <= *t && !self.notified_thresholds.contains(t))
            .min()
    }
}

#[cfg(test)]
#[path = "enforcement_tests.rs"]
mod tests;

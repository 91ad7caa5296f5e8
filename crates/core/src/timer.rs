// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifier type for the daemon's scheduled timers.
//!
//! TimerId uniquely identifies a scheduled wakeup: the coarse tracker tick,
//! the UsageDay rollover, a per-user grace-period reminder interval, or a
//! per-user/per-threshold warning check. Each constructor has a matching
//! `is_*` and, where applicable, a `username_str()` accessor so the engine
//! loop can recover context from a fired timer without a side table.

use crate::username::Username;

crate::define_id! {
    /// Unique identifier for a scheduled timer instance.
    pub struct TimerId;
}

impl TimerId {
    /// The global tracker tick (default 10s, `GUARDIAN_TICK_MS` override).
    pub fn tick() -> Self {
        Self::new("tick")
    }

    /// Global UsageDay boundary check.
    pub fn day_rollover() -> Self {
        Self::new("day-rollover")
    }

    /// Per-user grace-period reminder interval, while phase = Grace.
    pub fn grace_interval(username: &Username) -> Self {
        Self::new(format!("grace-interval:{}", username.as_str()))
    }

    /// Per-user, per-threshold warning check.
    pub fn warn_threshold(username: &Username, minutes: u16) -> Self {
        Self::new(format!("warn-threshold:{}:{}", username.as_str(), minutes))
    }

    pub fn is_tick(&self) -> bool {
        self.0 == "tick"
    }

    pub fn is_day_rollover(&self) -> bool {
        self.0 == "day-rollover"
    }

    pub fn is_grace_interval(&self) -> bool {
        self.0.starts_with("grace-interval:")
    }

    pub fn is_warn_threshold(&self) -> bool {
        self.0.starts_with("warn-threshold:")
    }

    /// Extracts the username portion, for any per-user timer kind.
    pub fn username_str(&self) -> Option<&str> {
        if let Some(rest) = self.0.strip_prefix("grace-interval:") {
            Some(rest)
        } else if let Some(rest) = self.0.strip_prefix("warn-threshold:") {
            rest.split(':').next()
        } else {
            None
        }
    }

    /// Extracts the threshold-minutes portion of a warn-threshold timer.
    pub fn warn_threshold_minutes(&self) -> Option<u16> {
        let rest = self.0.strip_prefix("warn-threshold:")?;
        rest.rsplit(':').next()?.parse().ok()
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;

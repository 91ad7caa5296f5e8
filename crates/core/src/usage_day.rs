// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UsageDay boundary math.
//!
//! A usage day is the logical window `[reset_instant_N, reset_instant_{N+1})`
//! anchored at `reset_time` in the policy's configured timezone. Changing
//! `reset_time` at runtime shifts the current window's start but never
//! rewrites historical session records.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// The `[start, end)` window of one usage day, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageDay {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UsageDay {
    /// The usage day containing `at`, given a `reset_time` of day and `tz`.
    pub fn containing(at: DateTime<Utc>, reset_time: NaiveTime, tz: Tz) -> Self {
        let local = at.with_timezone(&tz);
        let today_reset = local.date_naive().and_time(reset_time);
        let today_reset = tz
            .from_local_datetime(&today_reset)
            .single()
            .unwrap_or_else(|| tz.from_utc_datetime(&today_reset.naive_utc()));

        let (start_local, end_local) = if local.naive_local() >= today_reset.naive_local() {
            (today_reset, today_reset + chrono::Duration::days(1))
        } else {
            (today_reset - chrono::Duration::days(1), today_reset)
        };

        Self {
            start: start_local.with_timezone(&Utc),
            end: end_local.with_timezone(&Utc),
        }
    }

    /// Seconds of overlap between `[session_start, session_end)` and this day.
    ///
    /// `session_end = None` means the session is still open; it counts
    /// through `until` (typically "now").
    pub fn overlap_seconds(
        &self,
        session_start: DateTime<Utc>,
        session_end: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> f64 {
        let effective_end = session_end.unwrap_or(until).min(self.end);
        let effective_start = session_start.max(self.start);
        if effective_end <= effective_start {
            return 0.0;
        }
        (effective_end - effective_start).num_milliseconds() as f64 / 1000.0
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

#[cfg(test)]
#[path = "usage_day_tests.rs"]
mod tests;

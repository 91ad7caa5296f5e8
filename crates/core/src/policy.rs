// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed view over loaded, validated configuration.
//!
//! `Policy` and friends are produced by `guardian-config`'s validation step
//! and handed to consumers (PamWriter, SystemdWriter, Enforcer) as an
//! immutable snapshot. This module owns only the shape of that data — no
//! parsing, no I/O.

use crate::username::Username;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day of week, used as curfew map keys. `Ord` follows ISO week order
/// (Monday first) so curfew tables print and iterate predictably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Two-letter PAM day code.
    pub fn pam_code(self) -> &'static str {
        match self {
            Weekday::Mon => "Mo",
            Weekday::Tue => "Tu",
            Weekday::Wed => "We",
            Weekday::Thu => "Th",
            Weekday::Fri => "Fr",
            Weekday::Sat => "Sa",
            Weekday::Sun => "Su",
        }
    }

    pub fn from_chrono(w: chrono::Weekday) -> Self {
        match w {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }
}

/// A single `start..end` curfew window on one day, `start < end` already enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurfewWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl CurfewWindow {
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

/// Grace-period knobs (`notifications.grace`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraceConfig {
    pub enabled: bool,
    pub duration_seconds: u32,
    pub interval_seconds: u32,
}

/// Per-user policy, either a user override or the defaults block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPolicy {
    pub daily_quota_seconds: u32,
    pub curfew: BTreeMap<Weekday, CurfewWindow>,
    pub grace_seconds: u32,
}

/// Ordered, deduplicated set of warning thresholds, most urgent last.
///
/// Stored ascending (e.g. `[5, 10, 15]`) so "next unnotified T" scans are a
/// simple forward walk and tie-breaking (smallest T wins) is a
/// `min` over the unnotified subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarnThresholds(Vec<u16>);

impl WarnThresholds {
    pub fn new(mut minutes: Vec<u16>) -> Self {
        minutes.sort_unstable();
        minutes.dedup();
        Self(minutes)
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPolicy {
    pub pre_quota_warn_minutes: WarnThresholds,
    pub grace: GraceConfig,
}

/// Fully resolved, validated policy snapshot — the unit ConfigLoader publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub users: BTreeMap<Username, UserPolicy>,
    pub defaults: UserPolicy,
    pub notifications: NotificationPolicy,
    pub reset_time: NaiveTime,
    pub timezone: chrono_tz::Tz,
}

impl Policy {
    /// A user is managed iff it has an explicit entry in `users`.
    pub fn is_managed(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn user_policy(&self, username: &str) -> Option<&UserPolicy> {
        self.users.get(username)
    }

    pub fn managed_usernames(&self) -> impl Iterator<Item = &Username> {
        self.users.keys()
    }
}

// chrono_tz::Tz doesn't implement Eq, only PartialEq via its discriminant;
// this is fine since Tz is a plain enum of zone identifiers.
impl Eq for Policy {}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deserialization shape of the configuration file.
//!
//! Kept deliberately dumb: every field is `#[serde(default)]` (matching the
//! per-field-default pattern the pack's own config structs use), and
//! meaning is attached afterwards in `validate.rs`. Parse and validate are
//! kept as two separate fallible steps so `ConfigError::Parse` and
//! `ConfigError::Validate` stay distinguishable.

use serde::Deserialize;
use std::collections::BTreeMap;

fn default_db_path() -> String {
    "/var/lib/guardian/guardian.sqlite".to_string()
}

fn default_ipc_socket() -> String {
    "/run/guardian-daemon.sock".to_string()
}

fn default_reset_time() -> String {
    "03:00".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub timezone: String,
    pub reset_time: String,
    pub db_path: String,
    pub ipc_socket: String,
    pub notifications: RawNotifications,
    pub defaults: RawDefaults,
    pub users: BTreeMap<String, RawUserOverride>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            reset_time: default_reset_time(),
            db_path: default_db_path(),
            ipc_socket: default_ipc_socket(),
            notifications: RawNotifications::default(),
            defaults: RawDefaults::default(),
            users: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNotifications {
    pub pre_quota_minutes: Vec<u16>,
    pub grace_period: RawGracePeriod,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawGracePeriod {
    pub enabled: bool,
    /// Minutes between grace-period reminder notifications.
    pub duration: u32,
    pub interval: u32,
}

/// The `defaults` block: every managed user without an explicit override
/// inherits these values verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDefaults {
    pub daily_quota_minutes: u32,
    /// Day name (or `weekdays`/`weekend` alias) to `"HH:MM-HH:MM"`.
    pub curfew: BTreeMap<String, String>,
    pub grace_minutes: u32,
}

/// A `users.<name>` entry. Every field absent here falls back to
/// `defaults`; an empty `{}` block (e.g. `kid2: {}`) inherits everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUserOverride {
    pub daily_quota_minutes: Option<u32>,
    pub curfew: Option<BTreeMap<String, String>>,
    pub grace_minutes: Option<u32>,
}

#[cfg(test)]
#[path = "raw_tests.rs"]
mod tests;

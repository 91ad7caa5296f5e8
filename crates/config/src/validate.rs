// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a parsed [`RawConfig`] into a validated [`Policy`] + global knobs,
//! Unknown top-level keys are handled
//! separately in `loader.rs` (a residual-key scan over `serde_yaml::Value`
//! before this step runs), since `RawConfig` itself silently drops them.

use crate::error::ConfigError;
use crate::raw::{RawConfig, RawDefaults, RawUserOverride};
use chrono::NaiveTime;
use guardian_core::{
    CurfewWindow, GraceConfig, NotificationPolicy, Policy, UserPolicy, Username, WarnThresholds,
    Weekday,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Global knobs that live alongside `Policy` in a published `Snapshot` but
/// aren't part of the enforcement model itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalPaths {
    pub db_path: PathBuf,
    pub ipc_socket: PathBuf,
}

pub fn validate(raw: RawConfig) -> Result<(Policy, GlobalPaths), ConfigError> {
    let reset_time = parse_time(&raw.reset_time)
        .ok_or_else(|| ConfigError::Validate(format!("invalid reset_time '{}'", raw.reset_time)))?;

    let timezone = chrono_tz::Tz::from_str(&raw.timezone)
        .map_err(|_| ConfigError::Validate(format!("unresolvable timezone '{}'", raw.timezone)))?;

    let defaults = validate_defaults(&raw.defaults)?;

    let mut users = BTreeMap::new();
    for (name, override_) in &raw.users {
        let username = Username::parse(name.clone())
            .map_err(|e| ConfigError::Validate(format!("invalid username '{name}': {e}")))?;
        let resolved = resolve_override(&defaults, override_)?;
        users.insert(username, resolved);
    }

    let pre_quota_warn_minutes = WarnThresholds::new(raw.notifications.pre_quota_minutes.clone());
    let grace = GraceConfig {
        enabled: raw.notifications.grace_period.enabled,
        duration_seconds: minutes_to_seconds(raw.notifications.grace_period.duration),
        interval_seconds: minutes_to_seconds(raw.notifications.grace_period.interval),
    };

    let policy = Policy {
        users,
        defaults,
        notifications: NotificationPolicy {
            pre_quota_warn_minutes,
            grace,
        },
        reset_time,
        timezone,
    };

    let paths = GlobalPaths {
        db_path: PathBuf::from(&raw.db_path),
        ipc_socket: PathBuf::from(&raw.ipc_socket),
    };

    Ok((policy, paths))
}

fn minutes_to_seconds(minutes: u32) -> u32 {
    minutes.saturating_mul(60)
}

fn validate_defaults(raw: &RawDefaults) -> Result<UserPolicy, ConfigError> {
    Ok(UserPolicy {
        daily_quota_seconds: minutes_to_seconds(raw.daily_quota_minutes),
        curfew: parse_curfew_map(&raw.curfew)?,
        grace_seconds: minutes_to_seconds(raw.grace_minutes),
    })
}

fn resolve_override(
    defaults: &UserPolicy,
    raw: &RawUserOverride,
) -> Result<UserPolicy, ConfigError> {
    let daily_quota_seconds = match raw.daily_quota_minutes {
        Some(minutes) => minutes_to_seconds(minutes),
        None => defaults.daily_quota_seconds,
    };
    let grace_seconds = match raw.grace_minutes {
        Some(minutes) => minutes_to_seconds(minutes),
        None => defaults.grace_seconds,
    };
    let curfew = match &raw.curfew {
        Some(map) => parse_curfew_map(map)?,
        None => defaults.curfew.clone(),
    };

    Ok(UserPolicy {
        daily_quota_seconds,
        curfew,
        grace_seconds,
    })
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Expands day-name/alias keys (`monday` .. `sunday`, `weekdays`, `weekend`)
/// into a per-weekday map, parsing each `"HH:MM-HH:MM"` value. Specific day
/// names always win over an alias also present in the same map, regardless
/// of key order, since a BTreeMap iterates alphabetically and "weekdays"
/// sorts after most day names.
fn parse_curfew_map(raw: &BTreeMap<String, String>) -> Result<BTreeMap<Weekday, CurfewWindow>, ConfigError> {
    let mut windows: BTreeMap<Weekday, CurfewWindow> = BTreeMap::new();

    for (key, value) in raw {
        let window = parse_curfew_window(value)?;
        for day in expand_day_key(key)? {
            windows.insert(day, window);
        }
    }

    // Re-apply exact day names last so they win over `weekdays`/`weekend`.
    for (key, value) in raw {
        if let Some(day) = single_day(key) {
            windows.insert(day, parse_curfew_window(value)?);
        }
    }

    Ok(windows)
}

fn single_day(key: &str) -> Option<Weekday> {
    match key {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn expand_day_key(key: &str) -> Result<Vec<Weekday>, ConfigError> {
    if let Some(day) = single_day(key) {
        return Ok(vec![day]);
    }
    match key {
        "weekdays" => Ok(vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]),
        "weekend" => Ok(vec![Weekday::Sat, Weekday::Sun]),
        other => Err(ConfigError::Validate(format!(
            "unknown curfew day key '{other}' (expected a weekday name, 'weekdays', or 'weekend')"
        ))),
    }
}

fn parse_curfew_window(value: &str) -> Result<CurfewWindow, ConfigError> {
    let (start_s, end_s) = value
        .split_once('-')
        .ok_or_else(|| ConfigError::Validate(format!("curfew window '{value}' must be HH:MM-HH:MM")))?;
    let start = parse_time(start_s.trim())
        .ok_or_else(|| ConfigError::Validate(format!("invalid curfew start time in '{value}'")))?;
    let end = parse_time(end_s.trim())
        .ok_or_else(|| ConfigError::Validate(format!("invalid curfew end time in '{value}'")))?;
    if start >= end {
        return Err(ConfigError::Validate(format!(
            "curfew window '{value}' has start >= end"
        )));
    }
    Ok(CurfewWindow { start, end })
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;

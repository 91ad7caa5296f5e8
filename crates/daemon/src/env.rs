// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve the daemon's runtime state directory:
/// `GUARDIAN_STATE_DIR` > `XDG_STATE_HOME/guardian` > `/var/lib/guardian`.
///
/// Unlike a per-user session daemon, guardian-daemon normally runs as
/// root with no `HOME`, so the fallback is a system path rather than
/// `~/.local/state`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("GUARDIAN_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("guardian"));
    }
    Ok(PathBuf::from("/var/lib/guardian"))
}

/// Override for the enforcer/tracker tick cadence, mainly for tests and
/// manual debugging against a live config.
pub fn tick_interval_ms() -> Option<Duration> {
    std::env::var("GUARDIAN_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Path to the PAM time-config fragment guardian-daemon maintains a
/// block within. Overridable for tests; defaults to the real
/// `pam_time.so` config file on a stock Linux-PAM install.
pub fn pam_time_conf_path() -> PathBuf {
    std::env::var("GUARDIAN_PAM_TIME_CONF")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/security/time.conf"))
}

/// Directory guardian-daemon's systemd units live in, diffed and
/// reconciled by `SystemdWriter`.
pub fn systemd_unit_dir() -> PathBuf {
    std::env::var("GUARDIAN_SYSTEMD_UNIT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/systemd/system"))
}

/// Linux group whose members are exempt from the managed-user rule set.
pub fn managed_group() -> String {
    std::env::var("GUARDIAN_MANAGED_GROUP").unwrap_or_else(|_| "guardian-managed".to_string())
}

/// Group that owns the admin IPC socket.
pub fn admin_group() -> String {
    std::env::var("GUARDIAN_ADMIN_GROUP").unwrap_or_else(|_| "guardian-admin".to_string())
}

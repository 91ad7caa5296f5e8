// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Overrides `DbusAgentNotifyAdapter`'s per-call timeout (default 5000ms),
/// so tests can turn a hung agent into a fast failure instead of a wedged run.
pub fn agent_notify_timeout() -> Duration {
    parse_duration_ms("GUARDIAN_AGENT_NOTIFY_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

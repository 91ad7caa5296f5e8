// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff with jitter for LoginSource reconnects.
//!
//! Initial 2s, factor 2, capped at 60s, +/-20% jitter.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ReconnectBackoff {
    initial: Duration,
    factor: f64,
    cap: Duration,
    jitter: f64,
    attempt: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 2.0, Duration::from_secs(60), 0.2)
    }
}

impl ReconnectBackoff {
    pub fn new(initial: Duration, factor: f64, cap: Duration, jitter: f64) -> Self {
        Self {
            initial,
            factor,
            cap,
            jitter,
            attempt: 0,
        }
    }

    /// Resets the attempt counter after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// The delay to wait before the next reconnect attempt, advancing the
    /// internal attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.initial.as_secs_f64() * self.factor.powi(self.attempt as i32);
        let base = base.min(self.cap.as_secs_f64());
        self.attempt = self.attempt.saturating_add(1);

        let jitter_span = base * self.jitter;
        let offset = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
        Duration::from_secs_f64((base + offset).max(0.0))
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic + wall-clock abstraction.
//!
//! Duration math (session accumulation, grace timers, backoff) always goes
//! through [`Clock::now_monotonic`]. Wall time is read only where
//! requires it: UsageDay boundary attribution, timestamps persisted for
//! audit/display, and reset-instant computation.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Abstraction over time so tests can control both clocks independently.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now_wall(&self) -> DateTime<Utc>;
    fn now_monotonic(&self) -> Instant;
}

/// Production clock backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_wall(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_monotonic(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests.
///
/// Both wall and monotonic time are advanced explicitly via [`FakeClock::advance`]
/// so that tests can reproduce clock-jump scenarios (backwards
/// wall-clock jump) without the monotonic side moving.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<FakeClockInner>,
}

struct FakeClockInner {
    // Signed nanosecond offset from a fixed epoch, so backwards wall-clock
    // jumps are representable. Stored as an atomic so clones
    // share state.
    wall_nanos: AtomicI64,
    epoch: DateTime<Utc>,
    base: Instant,
    monotonic_offset_ms: AtomicU64,
    // Instant has no "set" API; guard its replacement value behind a mutex
    // of the base and offset so advance() only needs monotonic addition.
    _lock: Mutex<()>,
}

impl FakeClock {
    /// Construct a fake clock anchored at `wall` with monotonic time starting now.
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(FakeClockInner {
                wall_nanos: AtomicI64::new(0),
                epoch: wall,
                base: Instant::now(),
                monotonic_offset_ms: AtomicU64::new(0),
                _lock: Mutex::new(()),
            }),
        }
    }

    /// Advance both wall and monotonic clocks by the same duration.
    pub fn advance(&self, duration: std::time::Duration) {
        self.inner
            .wall_nanos
            .fetch_add(duration.as_nanos() as i64, Ordering::SeqCst);
        self.inner
            .monotonic_offset_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Advance only the wall clock, simulating a clock jump with no elapsed
    /// monotonic time (or a backwards jump if `duration` is negative-represented
    /// via [`FakeClock::set_wall`]).
    pub fn advance_wall_only(&self, duration: std::time::Duration) {
        self.inner
            .wall_nanos
            .fetch_add(duration.as_nanos() as i64, Ordering::SeqCst);
    }

    /// Set the wall clock to an absolute instant, independent of monotonic time.
    /// Used to simulate backwards wall-clock jumps.
    pub fn set_wall(&self, wall: DateTime<Utc>) {
        let delta = wall - self.inner.epoch;
        let nanos = delta.num_nanoseconds().unwrap_or(0);
        self.inner.wall_nanos.store(nanos, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_wall(&self) -> DateTime<Utc> {
        let nanos = self.inner.wall_nanos.load(Ordering::SeqCst);
        self.inner.epoch + chrono::Duration::nanoseconds(nanos)
    }

    fn now_monotonic(&self) -> Instant {
        let ms = self.inner.monotonic_offset_ms.load(Ordering::SeqCst);
        self.inner.base + std::time::Duration::from_millis(ms)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

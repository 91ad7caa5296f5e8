// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Terminator, TerminatorError};
use async_trait::async_trait;
use guardian_core::Username;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TerminateCall {
    pub username: String,
}

struct State {
    calls: Vec<TerminateCall>,
    fail_next: u32,
}

/// Fake terminator. `fail_next(n)` makes the next `n` calls fail before
/// calls start succeeding, for exercising Enforcer's `Terminating` retry
/// behavior without a real retry loop inside the fake itself.
#[derive(Clone)]
pub struct FakeTerminator {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeTerminator {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                fail_next: 0,
            })),
        }
    }
}

impl FakeTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: u32) {
        self.inner.lock().fail_next = n;
    }

    pub fn calls(&self) -> Vec<TerminateCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count_for(&self, username: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.username == username)
            .count()
    }
}

#[async_trait]
impl Terminator for FakeTerminator {
    async fn terminate_user(&self, username: &Username) -> Result<(), TerminatorError> {
        let mut state = self.inner.lock();
        state.calls.push(TerminateCall {
            username: username.as_str().to_string(),
        });
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(TerminatorError::Failed("simulated failure".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

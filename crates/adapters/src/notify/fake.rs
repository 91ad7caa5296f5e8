// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError, Urgency};
use async_trait::async_trait;
use guardian_core::Username;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded notification
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub username: String,
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

struct FakeNotifyState {
    calls: Vec<NotifyCall>,
}

/// Fake notification adapter for testing
#[derive(Clone)]
pub struct FakeNotifyAdapter {
    inner: Arc<Mutex<FakeNotifyState>>,
}

impl Default for FakeNotifyAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeNotifyState { calls: Vec::new() })),
        }
    }
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded notifications for a single user, in send order.
    pub fn calls_for(&self, username: &str) -> Vec<NotifyCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.username == username)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(
        &self,
        username: &Username,
        title: &str,
        body: &str,
        urgency: Urgency,
    ) -> Result<(), NotifyError> {
        self.inner.lock().calls.push(NotifyCall {
            username: username.as_str().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            urgency,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification delivery to the per-user notification agent.
//!
//! The daemon never blocks enforcement on delivery: every implementation
//! here returns quickly, and a delivery failure is logged, not propagated
//! into the Enforcer's state machine.

mod dbus_agent;
mod desktop;
mod noop;

pub use dbus_agent::DbusAgentNotifyAdapter;
pub use desktop::DesktopNotifyAdapter;
pub use noop::NoOpNotifyAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use guardian_core::Username;
use thiserror::Error;

/// Notification urgency, carried verbatim to the agent's `Notify` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Urgency {
    Low = 0,
    Normal = 1,
    Critical = 2,
}

/// Errors from notification delivery. Always logged, never fatal to the
/// caller's state machine.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no agent found for user {0}")]
    NoAgent(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Delivers a notification to a managed user's per-user agent.
#[async_trait]
pub trait NotifyAdapter: Send + Sync + 'static {
    /// Calls `Notify(title, body, urgency)` on `org.guardian.Agent.<username>.*`.
    async fn notify(
        &self,
        username: &Username,
        title: &str,
        body: &str,
        urgency: Urgency,
    ) -> Result<(), NotifyError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LoginSource: the session-bus subscription that feeds `SessionTracker`.
//!
//! Implementations run until told to stop, pushing `Event::{NewSession,
//! RemovedSession, Locked, Unlocked, Resync}` onto a channel. A `Resync` is
//! mandatory on every successful (re)connect — consumers treat it as ground
//! truth and reconcile their open-session view against it.

mod backoff;
mod filter;
mod logind;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use backoff::ReconnectBackoff;
pub use filter::FilteringLoginSource;
pub use logind::LogindLoginSource;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLoginSource;

use async_trait::async_trait;
use guardian_core::Event;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// Subscribes to the OS session bus and streams session lifecycle events.
#[async_trait]
pub trait LoginSourceAdapter: Send + Sync + 'static {
    /// Runs until `shutdown` is notified, sending events to `tx`. Must
    /// reconnect with backoff on disconnect and emit a `Resync` after every
    /// successful (re)connect, including the first.
    async fn run(&self, tx: mpsc::Sender<Event>, shutdown: Arc<Notify>);
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

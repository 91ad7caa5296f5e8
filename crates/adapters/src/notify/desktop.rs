// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification fallback using `notify-rust`'s libnotify backend.
//!
//! Bypasses the per-user agent entirely and posts straight to whatever
//! notification daemon is running on the session bus. Useful for
//! deployments that haven't installed the dedicated agent yet; the
//! `username` argument is accepted for trait-signature parity but unused,
//! since libnotify has no notion of which user it's addressing.

use super::{NotifyAdapter, NotifyError, Urgency};
use async_trait::async_trait;
use guardian_core::Username;

#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifyAdapter;

impl DesktopNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn to_libnotify_urgency(urgency: Urgency) -> notify_rust::Urgency {
    match urgency {
        Urgency::Low => notify_rust::Urgency::Low,
        Urgency::Normal => notify_rust::Urgency::Normal,
        Urgency::Critical => notify_rust::Urgency::Critical,
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn notify(
        &self,
        _username: &Username,
        title: &str,
        body: &str,
        urgency: Urgency,
    ) -> Result<(), NotifyError> {
        let title = title.to_string();
        let body = body.to_string();
        // notify_rust::Notification::show() blocks on a D-Bus round trip;
        // run it on the blocking pool so the reactor isn't stalled.
        tokio::task::spawn_blocking(move || {
            tracing::info!(%title, %body, "sending desktop notification");
            match notify_rust::Notification::new()
                .summary(&title)
                .body(&body)
                .urgency(to_libnotify_urgency(urgency))
                .show()
            {
                Ok(_) => tracing::info!(%title, "desktop notification sent"),
                Err(e) => tracing::warn!(%title, error = %e, "desktop notification failed"),
            }
        });
        Ok(())
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Picks one concrete `NotifyAdapter` at startup and wraps it so `Enforcer`
//! can be monomorphized over a single, non-generic type.

use async_trait::async_trait;
use guardian_adapters::{
    DbusAgentNotifyAdapter, DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError,
    Urgency,
};
use guardian_core::Username;
use tracing::warn;

#[derive(Clone)]
pub enum NotifierImpl {
    DbusAgent(DbusAgentNotifyAdapter),
    Desktop(DesktopNotifyAdapter),
    NoOp(NoOpNotifyAdapter),
}

impl NotifierImpl {
    /// Connects to the session bus for the per-user agent protocol,
    /// falling back to the desktop notifier (and finally to a silent
    /// no-op) rather than failing startup — notification delivery is
    /// never load-bearing for enforcement itself.
    pub async fn connect_or_fallback() -> Self {
        match DbusAgentNotifyAdapter::connect().await {
            Ok(adapter) => NotifierImpl::DbusAgent(adapter),
            Err(e) => {
                warn!(error = %e, "could not reach session bus for agent notifications, falling back to desktop notifier");
                NotifierImpl::Desktop(DesktopNotifyAdapter::new())
            }
        }
    }

    pub fn noop() -> Self {
        NotifierImpl::NoOp(NoOpNotifyAdapter::new())
    }
}

#[async_trait]
impl NotifyAdapter for NotifierImpl {
    async fn notify(
        &self,
        username: &Username,
        title: &str,
        body: &str,
        urgency: Urgency,
    ) -> Result<(), NotifyError> {
        match self {
            NotifierImpl::DbusAgent(a) => a.notify(username, title, body, urgency).await,
            NotifierImpl::Desktop(a) => a.notify(username, title, body, urgency).await,
            NotifierImpl::NoOp(a) => a.notify(username, title, body, urgency).await,
        }
    }
}

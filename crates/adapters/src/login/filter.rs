// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decorator that discards events for usernames the current Policy doesn't
//! manage, at the source, the way `TracedSession` wraps a `SessionAdapter`.

use super::LoginSourceAdapter;
use async_trait::async_trait;
use guardian_core::Event;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// Wraps a `LoginSourceAdapter`, dropping events for unmanaged usernames
/// before they reach the tracker. `Resync` snapshots are filtered
/// per-session rather than dropped wholesale, since the rest of the
/// snapshot is still ground truth for managed users.
pub struct FilteringLoginSource<S, F> {
    inner: S,
    is_managed: F,
}

impl<S, F> FilteringLoginSource<S, F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    pub fn new(inner: S, is_managed: F) -> Self {
        Self { inner, is_managed }
    }
}

#[async_trait]
impl<S, F> LoginSourceAdapter for FilteringLoginSource<S, F>
where
    S: LoginSourceAdapter,
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    async fn run(&self, tx: mpsc::Sender<Event>, shutdown: Arc<Notify>) {
        let (inner_tx, mut inner_rx) = mpsc::channel(256);
        let is_managed = &self.is_managed;

        let forward = async {
            while let Some(event) = inner_rx.recv().await {
                let keep = match &event {
                    Event::NewSession { username, .. } => is_managed(username.as_str()),
                    Event::RemovedSession { .. } | Event::Locked { .. } | Event::Unlocked { .. } => {
                        true // session-id-keyed events: tracker ignores unknown ids
                    }
                    Event::Resync { sessions } => {
                        let filtered: Vec<_> = sessions
                            .iter()
                            .filter(|s| is_managed(s.username.as_str()))
                            .cloned()
                            .collect();
                        if tx
                            .send(Event::Resync { sessions: filtered })
                            .await
                            .is_err()
                        {
                            return;
                        }
                        continue;
                    }
                    _ => true,
                };
                if keep && tx.send(event).await.is_err() {
                    return;
                }
            }
        };

        tokio::join!(self.inner.run(inner_tx, shutdown), forward);
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;

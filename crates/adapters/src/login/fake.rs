// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake LoginSource for testing. Scripted as a fixed sequence of events,
//! delivered one at a time as `push` calls a test drives, or all at once
//! via `with_script`.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::LoginSourceAdapter;
use async_trait::async_trait;
use guardian_core::Event;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

#[derive(Clone)]
pub struct FakeLoginSource {
    script: Arc<Mutex<Vec<Event>>>,
    disconnects: Arc<Mutex<u32>>,
}

impl Default for FakeLoginSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLoginSource {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Vec::new())),
            disconnects: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_script(events: Vec<Event>) -> Self {
        let source = Self::new();
        *source.script.lock() = events;
        source
    }

    /// Queues an event to be delivered on the next `run` poll.
    pub fn push(&self, event: Event) {
        self.script.lock().push(event);
    }

    /// Number of times `run` observed a (simulated) reconnect, for tests
    /// asserting `Resync` is re-emitted on recovery.
    pub fn reconnects(&self) -> u32 {
        *self.disconnects.lock()
    }

    pub fn simulate_reconnect(&self) {
        *self.disconnects.lock() += 1;
    }
}

#[async_trait]
impl LoginSourceAdapter for FakeLoginSource {
    async fn run(&self, tx: mpsc::Sender<Event>, shutdown: Arc<Notify>) {
        // Synthetic connect: always emit an (empty, unless scripted) Resync
        // first, matching the real adapter's on-connect contract.
        let _ = tx.send(Event::Resync { sessions: vec![] }).await;

        loop {
            let next = {
                let mut script = self.script.lock();
                if script.is_empty() {
                    None
                } else {
                    Some(script.remove(0))
                }
            };
            match next {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                None => {
                    tokio::select! {
                        _ = shutdown.notified() => return,
                        _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use guardian_core::{SessionId, Username};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::test]
async fn emits_resync_first_then_scripted_events() {
    let username = Username::parse("kid1".to_string()).unwrap();
    let source = FakeLoginSource::with_script(vec![Event::NewSession {
        id: SessionId::new("s1"),
        username,
        start_wall: chrono::Utc::now(),
    }]);
    let (tx, mut rx) = mpsc::channel(8);
    let shutdown = Arc::new(Notify::new());
    let shutdown2 = shutdown.clone();

    let handle = tokio::spawn(async move { source.run(tx, shutdown2).await });

    let first = rx.recv().await.unwrap();
    assert!(matches!(first, Event::Resync { .. }));
    let second = rx.recv().await.unwrap();
    assert!(matches!(second, Event::NewSession { .. }));

    shutdown.notify_waiters();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn stops_promptly_on_shutdown() {
    let source = FakeLoginSource::new();
    let (tx, _rx) = mpsc::channel(8);
    let shutdown = Arc::new(Notify::new());
    let shutdown2 = shutdown.clone();

    let handle = tokio::spawn(async move { source.run(tx, shutdown2).await });
    shutdown.notify_waiters();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("shutdown should complete within 1s")
        .unwrap();
}

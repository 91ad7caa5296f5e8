// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeLoginSource;
use super::*;
use guardian_core::{SessionId, SessionSnapshot, Username};
use tokio::sync::mpsc;

#[tokio::test]
async fn drops_new_session_for_unmanaged_username() {
    let kid = Username::parse("kid1".to_string()).unwrap();
    let stranger = Username::parse("guest".to_string()).unwrap();
    let inner = FakeLoginSource::with_script(vec![
        Event::NewSession {
            id: SessionId::new("s-stranger"),
            username: stranger,
            start_wall: chrono::Utc::now(),
        },
        Event::NewSession {
            id: SessionId::new("s-kid"),
            username: kid,
            start_wall: chrono::Utc::now(),
        },
    ]);
    let filtered = FilteringLoginSource::new(inner, |u: &str| u == "kid1");

    let (tx, mut rx) = mpsc::channel(8);
    let shutdown = Arc::new(Notify::new());
    let shutdown2 = shutdown.clone();
    let handle = tokio::spawn(async move { filtered.run(tx, shutdown2).await });

    let resync = rx.recv().await.unwrap();
    assert!(matches!(resync, Event::Resync { .. }));
    let kept = rx.recv().await.unwrap();
    match kept {
        Event::NewSession { username, .. } => assert_eq!(username.as_str(), "kid1"),
        other => panic!("expected NewSession, got {other:?}"),
    }

    shutdown.notify_waiters();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), handle).await;
}

#[tokio::test]
async fn resync_drops_unmanaged_sessions_but_keeps_managed_ones() {
    let kid = Username::parse("kid1".to_string()).unwrap();
    let stranger = Username::parse("guest".to_string()).unwrap();
    let inner = FakeLoginSource::with_script(vec![Event::Resync {
        sessions: vec![
            SessionSnapshot {
                id: SessionId::new("s-kid"),
                username: kid,
                start_wall: chrono::Utc::now(),
                locked: false,
            },
            SessionSnapshot {
                id: SessionId::new("s-stranger"),
                username: stranger,
                start_wall: chrono::Utc::now(),
                locked: false,
            },
        ],
    }]);
    let filtered = FilteringLoginSource::new(inner, |u: &str| u == "kid1");

    let (tx, mut rx) = mpsc::channel(8);
    let shutdown = Arc::new(Notify::new());
    let shutdown2 = shutdown.clone();
    let handle = tokio::spawn(async move { filtered.run(tx, shutdown2).await });

    let _initial_resync = rx.recv().await.unwrap();
    let scripted_resync = rx.recv().await.unwrap();
    match scripted_resync {
        Event::Resync { sessions } => {
            assert_eq!(sessions.len(), 1);
            assert_eq!(sessions[0].username.as_str(), "kid1");
        }
        other => panic!("expected Resync, got {other:?}"),
    }

    shutdown.notify_waiters();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), handle).await;
}

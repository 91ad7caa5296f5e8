// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real LoginSource backed by `org.freedesktop.login1` on the system bus.
//!
//! One task owns the `Manager` proxy and its `SessionNew`/`SessionRemoved`
//! signal streams; it spawns a short-lived watcher per active session
//! (mirroring the pack's per-agent watcher) that follows that session's
//! `Lock`/`Unlock` signals until the session goes away.

use super::LoginSourceAdapter;
use super::ReconnectBackoff;
use async_trait::async_trait;
use futures_util::StreamExt;
use guardian_core::{Event, SessionId, SessionSnapshot, Username};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use zbus::zvariant::ObjectPath;
use zbus::Connection;

#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait Login1Manager {
    #[allow(clippy::type_complexity)]
    fn list_sessions(
        &self,
    ) -> zbus::Result<Vec<(String, u32, String, String, zbus::zvariant::OwnedObjectPath)>>;

    #[zbus(signal)]
    fn session_new(&self, session_id: String, object_path: ObjectPath<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    fn session_removed(&self, session_id: String, object_path: ObjectPath<'_>) -> zbus::Result<()>;
}

#[zbus::proxy(interface = "org.freedesktop.login1.Session", default_service = "org.freedesktop.login1")]
trait Login1Session {
    #[zbus(property)]
    fn name(&self) -> zbus::Result<String>;

    #[zbus(property, name = "LockedHint")]
    fn locked_hint(&self) -> zbus::Result<bool>;

    #[zbus(signal)]
    fn lock(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn unlock(&self) -> zbus::Result<()>;
}

#[derive(Clone, Default)]
pub struct LogindLoginSource;

impl LogindLoginSource {
    pub fn new() -> Self {
        Self
    }

    async fn run_once(
        &self,
        tx: &mpsc::Sender<Event>,
        shutdown: Arc<Notify>,
    ) -> zbus::Result<()> {
        let conn = Connection::system().await?;
        let manager = Login1ManagerProxy::new(&conn).await?;

        let resync = resync_snapshot(&conn, &manager).await?;
        if tx.send(Event::Resync { sessions: resync }).await.is_err() {
            return Ok(());
        }

        let mut new_stream = manager.receive_session_new().await?;
        let mut removed_stream = manager.receive_session_removed().await?;
        let mut watchers: HashMap<String, Arc<Notify>> = HashMap::new();

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    for stop in watchers.values() {
                        stop.notify_waiters();
                    }
                    return Ok(());
                }
                signal = new_stream.next() => {
                    let Some(signal) = signal else { return Err(disconnected()) };
                    let args = signal.args()?;
                    let stop = Arc::new(Notify::new());
                    watchers.insert(args.session_id.clone(), stop.clone());
                    spawn_session_watcher(
                        conn.clone(),
                        args.session_id.clone(),
                        args.object_path.to_owned(),
                        tx.clone(),
                        stop,
                    );
                }
                signal = removed_stream.next() => {
                    let Some(signal) = signal else { return Err(disconnected()) };
                    let args = signal.args()?;
                    if let Some(stop) = watchers.remove(&args.session_id) {
                        stop.notify_waiters();
                    }
                    if tx
                        .send(Event::RemovedSession {
                            id: SessionId::new(args.session_id.clone()),
                            at: chrono::Utc::now(),
                        })
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn disconnected() -> zbus::Error {
    zbus::Error::InputOutput(Arc::new(std::io::Error::other("session bus signal stream ended")))
}

async fn resync_snapshot(
    conn: &Connection,
    manager: &Login1ManagerProxy<'_>,
) -> zbus::Result<Vec<SessionSnapshot>> {
    let mut snapshots = Vec::new();
    for (session_id, _uid, username, _seat, path) in manager.list_sessions().await? {
        let Ok(username) = Username::parse(username) else {
            continue; // not a managed-shape username; Policy filtering drops it anyway
        };
        let session = Login1SessionProxy::builder(conn)
            .path(path)
            .ok();
        let session = match session {
            Some(builder) => builder.build().await.ok(),
            None => None,
        };
        let locked = match &session {
            Some(proxy) => proxy.locked_hint().await.unwrap_or(false),
            None => false,
        };
        snapshots.push(SessionSnapshot {
            id: SessionId::new(session_id),
            username,
            start_wall: chrono::Utc::now(),
            locked,
        });
    }
    Ok(snapshots)
}

fn spawn_session_watcher(
    conn: Connection,
    session_id: String,
    path: zbus::zvariant::OwnedObjectPath,
    tx: mpsc::Sender<Event>,
    stop: Arc<Notify>,
) {
    tokio::spawn(async move {
        let builder = match Login1SessionProxy::builder(&conn).path(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "invalid session object path");
                return;
            }
        };
        let proxy = match builder.build().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "failed to attach session proxy");
                return;
            }
        };

        let Ok(mut lock_stream) = proxy.receive_lock().await else {
            return;
        };
        let Ok(mut unlock_stream) = proxy.receive_unlock().await else {
            return;
        };

        loop {
            tokio::select! {
                _ = stop.notified() => return,
                signal = lock_stream.next() => {
                    if signal.is_none() { return; }
                    let _ = tx.send(Event::Locked { id: SessionId::new(session_id.clone()), at: chrono::Utc::now() }).await;
                }
                signal = unlock_stream.next() => {
                    if signal.is_none() { return; }
                    let _ = tx.send(Event::Unlocked { id: SessionId::new(session_id.clone()), at: chrono::Utc::now() }).await;
                }
            }
        }
    });
}

#[async_trait]
impl LoginSourceAdapter for LogindLoginSource {
    async fn run(&self, tx: mpsc::Sender<Event>, shutdown: Arc<Notify>) {
        let mut backoff = ReconnectBackoff::default();
        loop {
            match self.run_once(&tx, shutdown.clone()).await {
                Ok(()) => return, // clean shutdown
                Err(e) => {
                    tracing::warn!(error = %e, "login1 bus connection lost, reconnecting");
                }
            }
            let delay = backoff.next_delay();
            tokio::select! {
                _ = shutdown.notified() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

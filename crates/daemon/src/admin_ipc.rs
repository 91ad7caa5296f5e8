// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin IPC: a Unix domain stream socket serving the small set of
//! administrative commands an operator (or `guardianctl`) can issue —
//! status, quota lookups, bonus grants, config reload, timer listing.
//!
//! One task per connection; each handles exactly one request/response
//! pair before the client disconnects, mirroring the request shape in
//! §4.8 (no persistent sessions, no server-push).

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use guardian_config::ConfigLoader;
use guardian_core::{SystemClock, Username};
use guardian_engine::{Enforcer, SessionTracker};
use guardian_storage::Storage;
use parking_lot::Mutex;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use crate::notifier::NotifierImpl;
use crate::protocol::{self, QuotaInfo, Request, Response, StatusInfo, TimerInfo, DEFAULT_TIMEOUT};
use crate::systemd_writer::SystemdWriter;

pub type EnforcerImpl = Enforcer<SystemClock, NotifierImpl, guardian_adapters::SystemTerminator>;

/// Per-user bonus seconds granted for the current UsageDay, shared
/// between the admin socket (which grants them) and the main tick loop
/// (which folds them into the effective quota before evaluating Enforcer).
pub type BonusTable = Arc<Mutex<HashMap<Username, u32>>>;

/// Shared daemon context every admin connection handler reads from.
pub struct AdminCtx {
    pub tracker: Arc<SessionTracker<SystemClock>>,
    pub enforcer: Arc<EnforcerImpl>,
    pub storage: Storage,
    pub config_loader: Arc<ConfigLoader>,
    pub systemd_writer: Arc<SystemdWriter>,
    pub bonuses: BonusTable,
    pub start_time: Instant,
}

/// Binds the admin socket with the ownership/permissions §4.8 requires:
/// owned root, group `guardian-admin`, mode 0660. Removes a stale socket
/// file left behind by an unclean shutdown before binding.
pub fn bind(path: &Path, admin_group: &str) -> std::io::Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let listener = UnixListener::bind(path)?;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o660))?;
    if let Ok(group) = nix::unistd::Group::from_name(admin_group) {
        if let Some(group) = group {
            let _ = nix::unistd::chown(path, None, Some(group.gid));
        } else {
            warn!(group = admin_group, "admin group not found, leaving socket group ownership unset");
        }
    }

    Ok(listener)
}

/// Accepts connections until `shutdown` fires, spawning one task per
/// connection so a slow or hostile client can't stall other admins.
pub async fn run(listener: UnixListener, ctx: Arc<AdminCtx>, shutdown: Arc<tokio::sync::Notify>) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                debug!("admin IPC listener stopping");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &ctx).await {
                                debug!(error = %e, "admin connection ended");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "admin socket accept failed"),
                }
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: &AdminCtx) -> Result<(), protocol::ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let frame = protocol::read_request_frame(&mut reader, DEFAULT_TIMEOUT).await?;

    // A bad frame (truncated read, timeout) is a connection problem and
    // propagates above to close the connection. A frame that arrived fine
    // but doesn't decode to a known `Request` — a stale client, an unknown
    // command tag — still gets an answer instead of a silent hang-up.
    let response = match protocol::decode::<Request>(&frame) {
        Ok(request) => dispatch(request, ctx).await,
        Err(e) => {
            debug!(error = %e, "admin request failed to decode");
            Response::unknown_command()
        }
    };
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await
}

async fn dispatch(request: Request, ctx: &AdminCtx) -> Response {
    match request {
        Request::Status => {
            let active_users = ctx.tracker.active_managed_users().await.len() as u32;
            Response::Status(StatusInfo {
                version: protocol::PROTOCOL_VERSION.to_string(),
                uptime_seconds: ctx.start_time.elapsed().as_secs(),
                active_users,
            })
        }
        Request::ListKids => {
            let users = ctx
                .config_loader
                .current()
                .policy
                .managed_usernames()
                .map(|u| u.as_str().to_string())
                .collect();
            Response::Kids { users }
        }
        Request::GetQuota { user } => get_quota(ctx, &user).await,
        Request::GrantBonus { user, minutes } => grant_bonus(ctx, &user, minutes).await,
        Request::Reload => match ctx.config_loader.reload_once() {
            Ok(changed) => Response::Reloaded { changed },
            Err(e) => Response::Error {
                error: "reload_failed".to_string(),
                detail: Some(e.to_string()),
            },
        },
        Request::ListTimers => {
            let units = ctx
                .systemd_writer
                .list_timers()
                .await
                .into_iter()
                .map(|t| TimerInfo { unit: t.unit, active: t.active })
                .collect();
            Response::Timers { units }
        }
    }
}

async fn get_quota(ctx: &AdminCtx, user: &str) -> Response {
    let snapshot = ctx.config_loader.current();
    let Some(user_policy) = snapshot.policy.user_policy(user) else {
        return Response::invalid_argument(format!("'{user}' is not a managed user"));
    };

    let bonus = ctx.bonuses.lock().get(user).copied().unwrap_or(0);
    let quota_seconds = user_policy.daily_quota_seconds + bonus;
    let used = ctx.tracker.used_seconds(user).await;
    let remaining = (quota_seconds as f64 - used).max(0.0);
    let phase = ctx.enforcer.phase_of(user);

    Response::Quota(QuotaInfo {
        quota_seconds,
        used_seconds: used as u32,
        remaining_seconds: remaining as u32,
        phase: format!("{phase:?}"),
    })
}

async fn grant_bonus(ctx: &AdminCtx, user: &str, minutes: u32) -> Response {
    if !(1..=240).contains(&minutes) {
        return Response::invalid_argument("minutes must be between 1 and 240");
    }
    let snapshot = ctx.config_loader.current();
    if snapshot.policy.user_policy(user).is_none() {
        return Response::invalid_argument(format!("'{user}' is not a managed user"));
    }
    let Ok(username) = Username::parse(user.to_string()) else {
        return Response::invalid_argument("invalid username");
    };

    let now = chrono::Utc::now();
    let day = guardian_core::UsageDay::containing(now, snapshot.policy.reset_time, snapshot.policy.timezone);
    let seconds = minutes * 60;

    if let Err(e) = ctx.storage.record_bonus(&username, day.start, seconds).await {
        error!(error = %e, "failed to persist bonus grant");
        return Response::Error {
            error: "storage_error".to_string(),
            detail: Some(e.to_string()),
        };
    }

    *ctx.bonuses.lock().entry(username).or_insert(0) += seconds;
    Response::BonusGranted
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Terminator, TerminatorError};
use crate::subprocess::{run_with_timeout, LOGINCTL_TIMEOUT};
use async_trait::async_trait;
use guardian_core::Username;
use std::time::Duration;
use zbus::Connection;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_SPACING: Duration = Duration::from_secs(5);

#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait Login1Manager {
    fn terminate_user(&self, uid: u32) -> zbus::Result<()>;
}

#[derive(Clone, Default)]
pub struct SystemTerminator;

impl SystemTerminator {
    pub fn new() -> Self {
        Self
    }

    async fn terminate_once(&self, username: &str) -> Result<(), TerminatorError> {
        if let Some(uid) = lookup_uid(username) {
            if let Ok(conn) = Connection::system().await {
                if let Ok(manager) = Login1ManagerProxy::new(&conn).await {
                    if manager.terminate_user(uid).await.is_ok() {
                        return Ok(());
                    }
                }
            }
        }

        let mut cmd = tokio::process::Command::new("loginctl");
        cmd.arg("terminate-user").arg(username);
        let output = run_with_timeout(cmd, LOGINCTL_TIMEOUT, "loginctl terminate-user")
            .await
            .map_err(|e| {
                if e.contains("timed out") {
                    TerminatorError::Timeout(LOGINCTL_TIMEOUT)
                } else {
                    TerminatorError::Failed(e)
                }
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TerminatorError::Failed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}

fn lookup_uid(username: &str) -> Option<u32> {
    nix::unistd::User::from_name(username)
        .ok()
        .flatten()
        .map(|u| u.uid.as_raw())
}

#[async_trait]
impl Terminator for SystemTerminator {
    async fn terminate_user(&self, username: &Username) -> Result<(), TerminatorError> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.terminate_once(username.as_str()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(%username, attempt, error = %e, "terminate-user attempt failed");
                    last_err = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_SPACING).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(TerminatorError::Failed("no attempts made".into())))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client for guardian-daemon's admin IPC socket.
//!
//! Unlike an orchestration CLI that auto-starts its daemon, `guardianctl`
//! talks to a privileged, systemd-managed process it has no business
//! spawning itself — a missing socket is reported as an error, never
//! papered over with a background launch.

use std::path::PathBuf;
use std::time::Duration;

use guardian_daemon::protocol::{self, ProtocolError};
use guardian_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

/// Env var overriding the admin socket path, mainly for tests against a
/// daemon started with a non-default `ipc_socket`.
pub const SOCKET_PATH_ENV: &str = "GUARDIAN_ADMIN_SOCKET";

/// Default admin socket path per the wire protocol.
pub const DEFAULT_SOCKET_PATH: &str = "/run/guardian-daemon.sock";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("guardian-daemon is not running (no socket at {0})")]
    DaemonNotRunning(PathBuf),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("daemon returned an unexpected response")]
    UnexpectedResponse,
}

fn timeout() -> Duration {
    std::env::var("GUARDIANCTL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Resolve the admin socket path: `GUARDIAN_ADMIN_SOCKET` env override,
/// else the conventional system path.
pub fn socket_path() -> PathBuf {
    std::env::var(SOCKET_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH))
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to the admin socket at the resolved path. Fails fast if the
    /// socket file doesn't exist rather than blocking on a connect attempt.
    pub fn connect() -> Result<Self, ClientError> {
        Self::connect_to(socket_path())
    }

    pub fn connect_to(socket_path: PathBuf) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning(socket_path));
        }
        Ok(Self { socket_path })
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(timeout(), protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = tokio::time::timeout(timeout(), protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&response_bytes)?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, the PID lock that keeps
//! a second instance from ever running against the same state directory.
//!
//! Durability lives in `guardian-storage`'s SQLite file, not a WAL/snapshot
//! pair — there is no replay step here, only the PID lock, a version
//! marker, and log setup.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::env::state_dir;

/// Daemon configuration: the small set of filesystem paths the daemon
/// itself owns, independent of the guardian.yaml config it loads.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. `/var/lib/guardian` or `$GUARDIAN_STATE_DIR`).
    pub state_dir: PathBuf,
    /// Admin IPC socket path, normally taken from the config snapshot.
    pub socket_path: PathBuf,
    /// Path to lock/PID file.
    pub lock_path: PathBuf,
    /// Path to version marker file.
    pub version_path: PathBuf,
    /// Path to the daemon's own log file.
    pub log_path: PathBuf,
}

impl Config {
    /// Loads daemon-owned paths. `socket_path` comes from the already
    /// loaded config snapshot since the admin socket location is
    /// administrator-configurable.
    pub fn load(socket_path: PathBuf) -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;
        Ok(Self {
            lock_path: state_dir.join("guardiand.pid"),
            version_path: state_dir.join("guardiand.version"),
            log_path: state_dir.join("guardiand.log"),
            socket_path,
            state_dir,
        })
    }
}

/// Daemon state during operation. The lock file is held for its exclusive
/// lock and released on drop.
pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: File,
    pub start_time: Instant,
}

impl DaemonState {
    /// Removes the filesystem artifacts startup created. The admin socket
    /// itself is removed by the caller once the listener task has actually
    /// stopped accepting connections, per the shutdown ordering in
    /// `main.rs`.
    pub fn cleanup_files(&self) {
        for path in [&self.config.lock_path, &self.config.version_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(?path, error = %e, "failed to remove daemon file on shutdown");
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Acquires the PID lock and writes the version marker. Cleans up any
/// files it created if a later startup step fails; never touches an
/// already-running daemon's files.
pub fn startup(config: Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(&config) {
        Ok(lock_file) => Ok(DaemonState {
            config,
            lock_file,
            start_time: Instant::now(),
        }),
        Err(e) => {
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&config);
            }
            Err(e)
        }
    }
}

fn startup_inner(config: &Config) -> Result<File, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating before the lock is held, so a failed
    // acquisition never wipes the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    info!(pid = std::process::id(), "acquired daemon lock");
    Ok(lock_file)
}

fn cleanup_on_failure(config: &Config) {
    for path in [&config.lock_path, &config.version_path] {
        let _ = std::fs::remove_file(path);
    }
}

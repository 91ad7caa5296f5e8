// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ConfigLoader`: loads the YAML config, validates it into a `Snapshot`,
//! and republishes on change.
//!
//! The previously accepted snapshot remains in force across any parse or
//! validation failure — callers never observe a half-applied reload.

use crate::error::ConfigError;
use crate::raw::RawConfig;
use crate::snapshot::Snapshot;
use crate::validate::validate;
use arc_swap::ArcSwap;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::{interval, Duration};

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "timezone",
    "reset_time",
    "db_path",
    "ipc_socket",
    "notifications",
    "defaults",
    "users",
];

pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_CONFIG_PATH: &str = "/etc/guardian/guardian.yaml";
pub const CONFIG_PATH_ENV: &str = "GUARDIAN_DAEMON_CONFIG";

type Subscriber = Box<dyn Fn(Arc<Snapshot>) + Send + Sync>;

/// Resolves the config path from `GUARDIAN_DAEMON_CONFIG`, falling back to
/// the conventional system location.
pub fn resolve_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub struct ConfigLoader {
    path: PathBuf,
    reload_interval: Duration,
    snapshot: ArcSwap<Snapshot>,
    last_hash: Mutex<[u8; 32]>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ConfigLoader {
    /// Loads `path` once and fails if it cannot be parsed and validated —
    /// there is no "prior snapshot" to fall back to on a cold start.
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let text = read_file(&path)?;
        let (snapshot, hash) = parse_and_validate(&text)?;

        Ok(Self {
            path,
            reload_interval: DEFAULT_RELOAD_INTERVAL,
            snapshot: ArcSwap::from_pointee(snapshot),
            last_hash: Mutex::new(hash),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Registers a callback invoked (in registration order) with the new
    /// snapshot after every successful reload that actually changed it.
    pub fn subscribe(&self, callback: impl Fn(Arc<Snapshot>) + Send + Sync + 'static) {
        self.subscribers.lock().unwrap().push(Box::new(callback));
    }

    /// Reads the file, hashes it, and — only if the hash changed — parses,
    /// validates, and atomically publishes a new snapshot. Returns whether
    /// a new snapshot was published. On any failure the prior snapshot
    /// remains in force and the error is returned for the caller to log.
    pub fn reload_once(&self) -> Result<bool, ConfigError> {
        let text = read_file(&self.path)?;
        let hash = content_hash(&text);

        {
            let last = self.last_hash.lock().unwrap();
            if *last == hash {
                return Ok(false);
            }
        }

        let (snapshot, _) = parse_and_validate(&text)?;

        *self.last_hash.lock().unwrap() = hash;
        let published = Arc::new(snapshot);
        self.snapshot.store(published.clone());

        for subscriber in self.subscribers.lock().unwrap().iter() {
            subscriber(published.clone());
        }

        Ok(true)
    }

    /// Runs `reload_once` on a fixed cadence until `shutdown` is notified.
    /// Reload failures are swallowed here (the prior snapshot stays live);
    /// callers that need the error for logging should call `reload_once`
    /// directly, as `AdminIpc`'s `reload` command does.
    pub async fn run_periodic(&self, shutdown: Arc<Notify>) {
        let mut ticker = interval(self.reload_interval);
        ticker.tick().await; // first tick fires immediately; already loaded
        loop {
            tokio::select! {
                _ = shutdown.notified() => return,
                _ = ticker.tick() => {
                    if let Err(e) = self.reload_once() {
                        tracing::warn!(error = %e, path = %self.path.display(), "config reload failed, keeping prior snapshot");
                    }
                }
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn content_hash(text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

fn parse_and_validate(text: &str) -> Result<(Snapshot, [u8; 32]), ConfigError> {
    warn_unknown_top_level_keys(text);

    let raw: RawConfig = serde_yaml::from_str(text)?;
    let (policy, paths) = validate(raw)?;
    let snapshot = Snapshot::new(policy, paths);
    Ok((snapshot, content_hash(text)))
}

/// Scans the raw YAML mapping for top-level keys `RawConfig` doesn't know
/// about. `#[serde(default)]` on `RawConfig` means unrecognized keys are
/// silently dropped by serde, so this is the only place that ever sees them.
fn warn_unknown_top_level_keys(text: &str) {
    let Ok(serde_yaml::Value::Mapping(map)) = serde_yaml::from_str::<serde_yaml::Value>(text)
    else {
        return;
    };
    for key in map.keys() {
        let Some(key) = key.as_str() else { continue };
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key) {
            tracing::warn!(key, "unknown top-level config key, ignoring");
        }
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

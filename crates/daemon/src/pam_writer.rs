// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintains a guardian-owned block inside the PAM `time.conf` fragment:
//! a default-permit rule for everyone outside the managed group, plus one
//! curfew rule per managed user.
//!
//! Writes are atomic (temp file + fsync + rename) and keep a bounded
//! backlog of timestamped backups so a bad write can be rolled back by
//! hand even if the daemon itself is down.

use std::fs::Permissions;
use std::io::Write;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use chrono::Utc;
use guardian_core::{CurfewWindow, Policy, Weekday};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{error, info, warn};

const BLOCK_START: &str = "# >>> guardian managed — do not edit >>>";
const BLOCK_END: &str = "# <<< guardian managed <<<";
const MAX_BACKUPS: usize = 5;

#[derive(Debug, Error)]
pub enum PamWriterError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("generated rule violates PAM line grammar: {0}")]
    InvalidRule(String),
}

type Result<T> = std::result::Result<T, PamWriterError>;

/// Rewrites the guardian-owned block of a PAM time-config file, never
/// touching anything outside the delimiters.
pub struct PamWriter {
    path: PathBuf,
    managed_group: String,
    /// Serializes writers so two reconciliations never race on the same
    /// temp-file name; reads outside the daemon always see committed
    /// (post-rename) content regardless.
    write_lock: Mutex<()>,
}

impl PamWriter {
    pub fn new(path: PathBuf, managed_group: String) -> Self {
        Self {
            path,
            managed_group,
            write_lock: Mutex::new(()),
        }
    }

    /// Regenerates the guardian block for `policy` and writes it
    /// atomically. On any failure, rolls back from the most recent backup
    /// so the file is never left half-written.
    pub fn reconcile(&self, policy: &Policy) -> Result<()> {
        let _guard = self.write_lock.lock();

        let block = render_block(policy, &self.managed_group)?;
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(PamWriterError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        let new_contents = splice_block(&existing, &block);

        if new_contents == existing {
            return Ok(());
        }

        match self.write_atomic(&new_contents) {
            Ok(()) => {
                self.backup(&existing)?;
                info!(path = %self.path.display(), "reconciled PAM time-config block");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "PAM write failed, attempting rollback from backup");
                if let Err(rollback_err) = self.rollback() {
                    error!(error = %rollback_err, "PAM rollback also failed; file may be inconsistent");
                }
                Err(e)
            }
        }
    }

    fn write_atomic(&self, contents: &str) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_path = dir.join(format!(
            ".{}.tmp",
            self.path.file_name().and_then(|n| n.to_str()).unwrap_or("time.conf")
        ));

        let (mode, uid, gid) = match std::fs::metadata(&self.path) {
            Ok(meta) => (meta.mode(), meta.uid(), meta.gid()),
            Err(_) => (0o644, 0, 0),
        };

        {
            let mut tmp = std::fs::File::create(&tmp_path).map_err(|e| PamWriterError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
            tmp.write_all(contents.as_bytes()).map_err(|e| PamWriterError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
            tmp.sync_all().map_err(|e| PamWriterError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
            tmp.set_permissions(Permissions::from_mode(mode)).ok();
            let _ = nix::unistd::chown(
                &tmp_path,
                Some(nix::unistd::Uid::from_raw(uid)),
                Some(nix::unistd::Gid::from_raw(gid)),
            );
        }

        std::fs::rename(&tmp_path, &self.path).map_err(|e| PamWriterError::Io {
            path: self.path.clone(),
            source: e,
        })
    }

    fn backup_path(&self, stamp: i64) -> PathBuf {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let name = self.path.file_name().and_then(|n| n.to_str()).unwrap_or("time.conf");
        dir.join(format!("{name}.{stamp}.bak"))
    }

    fn backup(&self, prior_contents: &str) -> Result<()> {
        let stamp = Utc::now().timestamp();
        let path = self.backup_path(stamp);
        std::fs::write(&path, prior_contents).map_err(|e| PamWriterError::Io { path, source: e })?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let name = self.path.file_name().and_then(|n| n.to_str()).unwrap_or("time.conf");
        let prefix = format!("{name}.");

        let mut backups: Vec<(i64, PathBuf)> = std::fs::read_dir(dir)
            .map_err(|e| PamWriterError::Io { path: dir.to_path_buf(), source: e })?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let file_name = file_name.to_str()?;
                let stamp_part = file_name.strip_prefix(&prefix)?.strip_suffix(".bak")?;
                let stamp: i64 = stamp_part.parse().ok()?;
                Some((stamp, entry.path()))
            })
            .collect();

        backups.sort_by_key(|(stamp, _)| *stamp);
        while backups.len() > MAX_BACKUPS {
            let (_, path) = backups.remove(0);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(?path, error = %e, "failed to prune old PAM backup");
            }
        }
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let name = self.path.file_name().and_then(|n| n.to_str()).unwrap_or("time.conf");
        let prefix = format!("{name}.");

        let mut backups: Vec<(i64, PathBuf)> = std::fs::read_dir(dir)
            .map_err(|e| PamWriterError::Io { path: dir.to_path_buf(), source: e })?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let file_name = file_name.to_str()?;
                let stamp_part = file_name.strip_prefix(&prefix)?.strip_suffix(".bak")?;
                let stamp: i64 = stamp_part.parse().ok()?;
                Some((stamp, entry.path()))
            })
            .collect();
        backups.sort_by_key(|(stamp, _)| *stamp);

        let Some((_, latest)) = backups.pop() else {
            return Ok(());
        };
        let contents = std::fs::read_to_string(&latest).map_err(|e| PamWriterError::Io {
            path: latest.clone(),
            source: e,
        })?;
        self.write_atomic(&contents)
    }
}

fn windows_rule(curfew: &std::collections::BTreeMap<Weekday, CurfewWindow>) -> String {
    curfew
        .iter()
        .map(|(day, window)| {
            format!(
                "{}{:02}{:02}-{:02}{:02}",
                day.pam_code(),
                window.start.format("%H").to_string().parse::<u32>().unwrap_or(0),
                window.start.format("%M").to_string().parse::<u32>().unwrap_or(0),
                window.end.format("%H").to_string().parse::<u32>().unwrap_or(0),
                window.end.format("%M").to_string().parse::<u32>().unwrap_or(0),
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Validates the emitted PAM line grammar: 3-4 semicolon-separated fields,
/// with `HHMM-HHMM` (optionally `&`-joined) time ranges in the last field.
fn validate_rule(rule: &str) -> Result<()> {
    let fields: Vec<&str> = rule.split(';').collect();
    if fields.len() != 4 {
        return Err(PamWriterError::InvalidRule(rule.to_string()));
    }
    let windows = fields[3];
    for range in windows.split('&') {
        let day_code_len = range.chars().take_while(|c| c.is_alphabetic()).count();
        let rest = &range[day_code_len..];
        let (start, end) = rest
            .split_once('-')
            .ok_or_else(|| PamWriterError::InvalidRule(rule.to_string()))?;
        if start.len() != 4 || end.len() != 4 || !start.chars().all(|c| c.is_ascii_digit()) || !end.chars().all(|c| c.is_ascii_digit()) {
            return Err(PamWriterError::InvalidRule(rule.to_string()));
        }
    }
    Ok(())
}

fn render_block(policy: &Policy, managed_group: &str) -> Result<String> {
    let mut lines = vec![BLOCK_START.to_string()];

    let default_permit = format!("*;*;!@{managed_group};Al0000-2400");
    validate_rule(&default_permit)?;
    lines.push(default_permit);

    for (username, user_policy) in &policy.users {
        let windows = windows_rule(&user_policy.curfew);
        let rule = format!("*;*;{};{}", username.as_str(), windows);
        validate_rule(&rule)?;
        lines.push(rule);
    }

    lines.push(BLOCK_END.to_string());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

/// Replaces the guardian block inside `existing` with `new_block`,
/// preserving every other line byte-for-byte. Appends the block if no
/// prior delimiters are found.
fn splice_block(existing: &str, new_block: &str) -> String {
    let start = existing.find(BLOCK_START);
    let end = existing.find(BLOCK_END);

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let after_end = existing[e..].find('\n').map(|i| e + i + 1).unwrap_or(existing.len());
            let mut out = String::new();
            out.push_str(&existing[..s]);
            out.push_str(new_block);
            out.push_str(&existing[after_end..]);
            out
        }
        _ => {
            let mut out = existing.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(new_block);
            out
        }
    }
}

#[cfg(test)]
#[path = "pam_writer_tests.rs"]
mod tests;

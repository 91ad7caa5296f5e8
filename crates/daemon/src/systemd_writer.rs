// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generates and reconciles the systemd units guardian-daemon relies on
//! for persistence across reboots: one daily reset timer, plus one
//! per-user curfew timer firing at that user's curfew end.
//!
//! Reconciliation diffs the desired unit set (derived from `Policy`)
//! against what's already on disk and only touches units that changed,
//! so an administrator's manual `systemctl` tweaks to unrelated units are
//! never clobbered.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use guardian_adapters::subprocess::{run_with_timeout, SYSTEMCTL_TIMEOUT};
use guardian_core::{Policy, Username};
use tokio::process::Command;
use tracing::{error, info, warn};

const DAILY_RESET_SERVICE: &str = "guardian-daily-reset.service";
const DAILY_RESET_TIMER: &str = "guardian-daily-reset.timer";
const MANAGED_PREFIX: &str = "guardian-";

pub struct SystemdWriter {
    unit_dir: PathBuf,
    /// Path to the `guardiand` binary invoked by the generated
    /// `ExecStart=` lines; normally the running process's own path.
    daemon_bin: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TimerState {
    pub unit: String,
    pub active: bool,
}

impl SystemdWriter {
    pub fn new(unit_dir: PathBuf, daemon_bin: PathBuf) -> Self {
        Self { unit_dir, daemon_bin }
    }

    /// Computes the desired unit files for `policy`, diffs them against
    /// what's on disk, writes changed units, and removes ones no longer
    /// desired. A failure reconciling one unit is logged and does not
    /// prevent the rest from reconciling.
    pub async fn reconcile(&self, policy: &Policy) {
        let desired = self.desired_units(policy);

        let existing = self.list_managed_units();
        for (name, contents) in &desired {
            let path = self.unit_dir.join(name);
            let changed = std::fs::read_to_string(&path).map(|c| &c != contents).unwrap_or(true);
            if !changed {
                continue;
            }
            if let Err(e) = write_atomic(&path, contents) {
                error!(unit = %name, error = %e, "failed to write systemd unit");
                continue;
            }
            if let Err(e) = self.systemctl(&["daemon-reload"]).await {
                error!(error = %e, "systemctl daemon-reload failed");
            }
            if name.ends_with(".timer") {
                if let Err(e) = self.systemctl(&["enable", "--now", name]).await {
                    error!(unit = %name, error = %e, "systemctl enable --now failed");
                }
            }
        }

        for name in existing {
            if desired.contains_key(&name) {
                continue;
            }
            if let Err(e) = self.systemctl(&["stop", &name]).await {
                warn!(unit = %name, error = %e, "systemctl stop failed during removal");
            }
            if let Err(e) = self.systemctl(&["disable", &name]).await {
                warn!(unit = %name, error = %e, "systemctl disable failed during removal");
            }
            let path = self.unit_dir.join(&name);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(unit = %name, error = %e, "failed to delete removed systemd unit");
            }
        }

        if let Err(e) = self.systemctl(&["daemon-reload"]).await {
            error!(error = %e, "final systemctl daemon-reload failed");
        }
    }

    /// Enumerates every unit this writer manages along with its current
    /// `systemctl is-active` state, for the `list-timers` admin command.
    pub async fn list_timers(&self) -> Vec<TimerState> {
        let mut out = Vec::new();
        for name in self.list_managed_units() {
            if !name.ends_with(".timer") {
                continue;
            }
            let active = self.is_active(&name).await;
            out.push(TimerState { unit: name, active });
        }
        out
    }

    fn list_managed_units(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.unit_dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.starts_with(MANAGED_PREFIX))
            .collect()
    }

    async fn is_active(&self, unit: &str) -> bool {
        let mut cmd = Command::new("systemctl");
        cmd.arg("is-active").arg(unit);
        match run_with_timeout(cmd, SYSTEMCTL_TIMEOUT, "systemctl is-active").await {
            Ok(output) => output.status.success(),
            Err(e) => {
                warn!(unit, error = %e, "systemctl is-active failed");
                false
            }
        }
    }

    async fn systemctl(&self, args: &[&str]) -> Result<(), String> {
        let mut cmd = Command::new("systemctl");
        cmd.args(args);
        let description = format!("systemctl {}", args.join(" "));
        let output = run_with_timeout(cmd, SYSTEMCTL_TIMEOUT, &description).await?;
        if !output.status.success() {
            return Err(format!(
                "{description} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        Ok(())
    }

    fn desired_units(&self, policy: &Policy) -> BTreeMap<String, String> {
        let mut units = BTreeMap::new();
        let bin = self.daemon_bin.display();

        units.insert(
            DAILY_RESET_SERVICE.to_string(),
            format!(
                "[Unit]\nDescription=Guardian daily usage reset\n\n[Service]\nType=oneshot\nExecStart={bin} --reset-day\n"
            ),
        );
        units.insert(
            DAILY_RESET_TIMER.to_string(),
            format!(
                "[Unit]\nDescription=Guardian daily usage reset timer\n\n[Timer]\nOnCalendar=*-*-* {}:00\nPersistent=true\n\n[Install]\nWantedBy=timers.target\n",
                policy.reset_time.format("%H:%M")
            ),
        );

        for (username, user_policy) in &policy.users {
            let Some(end) = latest_curfew_end(user_policy) else {
                continue;
            };
            let (service, timer) = curfew_unit_names(username);
            units.insert(
                service,
                format!(
                    "[Unit]\nDescription=Guardian curfew enforcement for {username}\n\n[Service]\nType=oneshot\nExecStart={bin} --enforce-curfew {username}\n",
                    username = username.as_str(),
                ),
            );
            units.insert(
                timer,
                format!(
                    "[Unit]\nDescription=Guardian curfew timer for {username}\n\n[Timer]\nOnCalendar=*-*-* {end}:00\nPersistent=true\n\n[Install]\nWantedBy=timers.target\n",
                    username = username.as_str(),
                    end = end.format("%H:%M"),
                ),
            );
        }

        units
    }
}

fn curfew_unit_names(username: &Username) -> (String, String) {
    let name = username.as_str();
    (
        format!("guardian-curfew@{name}.service"),
        format!("guardian-curfew@{name}.timer"),
    )
}

fn latest_curfew_end(user_policy: &guardian_core::UserPolicy) -> Option<chrono::NaiveTime> {
    user_policy.curfew.values().map(|w| w.end).max()
}

fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_path = dir.join(format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("unit")
    ));
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)
}

#[cfg(test)]
#[path = "systemd_writer_tests.rs"]
mod tests;

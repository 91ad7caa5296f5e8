// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `guardianctl status` — daemon version, uptime, active-user count.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use guardian_daemon::{Request, Response, StatusInfo};

pub async fn run(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let response = client.send(&Request::Status).await?;
    let info = match response {
        Response::Status(info) => info,
        Response::Error { error, detail } => {
            anyhow::bail!("{error}{}", detail.map(|d| format!(": {d}")).unwrap_or_default())
        }
        _ => anyhow::bail!("unexpected response from daemon"),
    };

    print!("{}", render(&info, format));
    Ok(())
}

fn render(info: &StatusInfo, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "version": info.version,
                "uptime_seconds": info.uptime_seconds,
                "active_users": info.active_users,
            });
            format!("{}\n", serde_json::to_string_pretty(&json).unwrap_or_default())
        }
        OutputFormat::Text => format!(
            "{}\n  version:      {}\n  uptime:       {}\n  active users: {}\n",
            crate::color::apply_header("guardian-daemon"),
            info.version,
            crate::output::format_duration_seconds(info.uptime_seconds.min(u32::MAX as u64) as u32),
            info.active_users,
        ),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

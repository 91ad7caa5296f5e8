// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `guardianctl get-quota <user>` — one managed user's quota/usage/phase.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use guardian_daemon::{QuotaInfo, Request, Response};

pub async fn run(client: &DaemonClient, user: &str, format: OutputFormat) -> Result<()> {
    let response = client.send(&Request::GetQuota { user: user.to_string() }).await?;
    let quota = match response {
        Response::Quota(q) => q,
        Response::Error { error, detail } => {
            anyhow::bail!("{error}{}", detail.map(|d| format!(": {d}")).unwrap_or_default())
        }
        _ => anyhow::bail!("unexpected response from daemon"),
    };

    print!("{}", render(user, &quota, format));
    Ok(())
}

fn render(user: &str, quota: &QuotaInfo, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "user": user,
                "quota_seconds": quota.quota_seconds,
                "used_seconds": quota.used_seconds,
                "remaining_seconds": quota.remaining_seconds,
                "phase": quota.phase,
            });
            format!("{}\n", serde_json::to_string_pretty(&json).unwrap_or_default())
        }
        OutputFormat::Text => format!(
            "{}\n  quota:     {}\n  used:      {}\n  remaining: {}\n  phase:     {}\n",
            crate::color::apply_header(user),
            crate::output::format_duration_seconds(quota.quota_seconds),
            crate::output::format_duration_seconds(quota.used_seconds),
            crate::output::format_duration_seconds(quota.remaining_seconds),
            crate::color::apply_status(&quota.phase),
        ),
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;

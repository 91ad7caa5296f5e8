// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `guardianctl grant-bonus <user> <minutes>` — adds bonus minutes to a
//! managed user's budget for the current UsageDay.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use guardian_daemon::{Request, Response};

/// Valid range per the admin IPC contract; checked client-side so an
/// obviously bad value never makes a round trip to the daemon.
const MIN_MINUTES: u32 = 1;
const MAX_MINUTES: u32 = 240;

pub async fn run(client: &DaemonClient, user: &str, minutes: u32, format: OutputFormat) -> Result<()> {
    if !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
        anyhow::bail!("minutes must be between {MIN_MINUTES} and {MAX_MINUTES}");
    }

    let response = client
        .send(&Request::GrantBonus { user: user.to_string(), minutes })
        .await?;
    match response {
        Response::BonusGranted => {
            print!("{}", render(user, minutes, format));
            Ok(())
        }
        Response::Error { error, detail } => {
            anyhow::bail!("{error}{}", detail.map(|d| format!(": {d}")).unwrap_or_default())
        }
        _ => anyhow::bail!("unexpected response from daemon"),
    }
}

fn render(user: &str, minutes: u32, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "user": user, "bonus_minutes": minutes, "granted": true });
            format!("{}\n", serde_json::to_string_pretty(&json).unwrap_or_default())
        }
        OutputFormat::Text => format!("granted {minutes} bonus minute(s) to {user}\n"),
    }
}

#[cfg(test)]
#[path = "bonus_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `guardianctl reload` — triggers an immediate ConfigLoader reload.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use guardian_daemon::{Request, Response};

pub async fn run(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let response = client.send(&Request::Reload).await?;
    let changed = match response {
        Response::Reloaded { changed } => changed,
        Response::Error { error, detail } => {
            anyhow::bail!("{error}{}", detail.map(|d| format!(": {d}")).unwrap_or_default())
        }
        _ => anyhow::bail!("unexpected response from daemon"),
    };

    print!("{}", render(changed, format));
    Ok(())
}

fn render(changed: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            format!("{}\n", serde_json::to_string_pretty(&serde_json::json!({ "changed": changed })).unwrap_or_default())
        }
        OutputFormat::Text => {
            if changed {
                "config reloaded: policy changed\n".to_string()
            } else {
                "config reloaded: no changes\n".to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "reload_tests.rs"]
mod tests;

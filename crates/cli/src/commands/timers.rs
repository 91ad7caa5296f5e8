// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `guardianctl list-timers` — enumerates managed systemd units and state.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};
use guardian_daemon::{Request, Response, TimerInfo};

pub async fn run(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let response = client.send(&Request::ListTimers).await?;
    let units = match response {
        Response::Timers { units } => units,
        Response::Error { error, detail } => {
            anyhow::bail!("{error}{}", detail.map(|d| format!(": {d}")).unwrap_or_default())
        }
        _ => anyhow::bail!("unexpected response from daemon"),
    };

    print!("{}", render(&units, format));
    Ok(())
}

fn render(units: &[TimerInfo], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let json: Vec<_> = units
                .iter()
                .map(|t| serde_json::json!({ "unit": t.unit, "active": t.active }))
                .collect();
            format!("{}\n", serde_json::to_string_pretty(&serde_json::json!({ "units": json })).unwrap_or_default())
        }
        OutputFormat::Text => {
            if units.is_empty() {
                return "(no managed units)\n".to_string();
            }
            let mut table = Table::new(vec![Column::left("UNIT"), Column::status("ACTIVE")]);
            for unit in units {
                table.row(vec![unit.unit.clone(), unit.active.to_string()]);
            }
            let mut buf = Vec::new();
            table.render(&mut buf);
            String::from_utf8(buf).unwrap_or_default()
        }
    }
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `guardianctl list-kids` — usernames currently under management.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};
use guardian_daemon::{Request, Response};

pub async fn run(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let response = client.send(&Request::ListKids).await?;
    let users = match response {
        Response::Kids { users } => users,
        Response::Error { error, detail } => {
            anyhow::bail!("{error}{}", detail.map(|d| format!(": {d}")).unwrap_or_default())
        }
        _ => anyhow::bail!("unexpected response from daemon"),
    };

    print!("{}", render(&users, format));
    Ok(())
}

fn render(users: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            format!("{}\n", serde_json::to_string_pretty(&serde_json::json!({ "users": users })).unwrap_or_default())
        }
        OutputFormat::Text => {
            if users.is_empty() {
                return "(no managed users)\n".to_string();
            }
            let mut table = Table::new(vec![Column::left("USER")]);
            for user in users {
                table.row(vec![user.clone()]);
            }
            let mut buf = Vec::new();
            table.render(&mut buf);
            String::from_utf8(buf).unwrap_or_default()
        }
    }
}

#[cfg(test)]
#[path = "kids_tests.rs"]
mod tests;

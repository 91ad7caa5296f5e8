// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! guardianctl — admin CLI for guardian-daemon.
//!
//! Talks to the daemon's Unix admin socket (`/run/guardian-daemon.sock`
//! by default) to query status, inspect quotas, grant bonus minutes,
//! trigger a config reload, and list the systemd units guardian-daemon
//! manages. Never starts or stops the daemon itself — it is a privileged,
//! systemd-managed process, not something an unprivileged admin CLI spawns.

mod client;
mod color;
mod commands;
mod output;
mod table;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "guardianctl",
    version,
    about = "Administer guardian-daemon: quotas, bonuses, curfew timers, config reload"
)]
struct Cli {
    /// Path to the admin socket (overrides GUARDIAN_ADMIN_SOCKET and the
    /// conventional /run/guardian-daemon.sock default).
    #[arg(long, global = true, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Daemon version, uptime, and active-user count
    Status,
    /// List usernames currently under management
    ListKids,
    /// Show one managed user's quota, usage, and enforcement phase
    GetQuota {
        /// Managed username
        user: String,
    },
    /// Grant extra minutes to a user's budget for the current day
    GrantBonus {
        /// Managed username
        user: String,
        /// Minutes to grant, 1-240
        minutes: u32,
    },
    /// Trigger an immediate configuration reload
    Reload,
    /// Enumerate managed systemd units and their state
    ListTimers,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::command_with_styles();
    let matches = cli.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    let client = match cli.socket.clone() {
        Some(path) => DaemonClient::connect_to(path)?,
        None => DaemonClient::connect()?,
    };

    match cli.command {
        Command::Status => commands::status::run(&client, cli.output).await,
        Command::ListKids => commands::kids::run(&client, cli.output).await,
        Command::GetQuota { user } => commands::quota::run(&client, &user, cli.output).await,
        Command::GrantBonus { user, minutes } => {
            commands::bonus::run(&client, &user, minutes, cli.output).await
        }
        Command::Reload => commands::reload::run(&client, cli.output).await,
        Command::ListTimers => commands::timers::run(&client, cli.output).await,
    }
}

impl Cli {
    fn command_with_styles() -> clap::Command {
        use clap::CommandFactory;
        Cli::command().styles(color::styles())
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{CommandFactory, Parser};

use super::Cli;

#[test]
fn cli_parses_each_subcommand() {
    let cli = Cli::try_parse_from(["guardianctl", "status"]).unwrap();
    assert!(matches!(cli.command, super::Command::Status));

    let cli = Cli::try_parse_from(["guardianctl", "list-kids"]).unwrap();
    assert!(matches!(cli.command, super::Command::ListKids));

    let cli = Cli::try_parse_from(["guardianctl", "get-quota", "kid1"]).unwrap();
    match cli.command {
        super::Command::GetQuota { user } => assert_eq!(user, "kid1"),
        _ => panic!("expected GetQuota"),
    }

    let cli = Cli::try_parse_from(["guardianctl", "grant-bonus", "kid1", "30"]).unwrap();
    match cli.command {
        super::Command::GrantBonus { user, minutes } => {
            assert_eq!(user, "kid1");
            assert_eq!(minutes, 30);
        }
        _ => panic!("expected GrantBonus"),
    }

    let cli = Cli::try_parse_from(["guardianctl", "reload"]).unwrap();
    assert!(matches!(cli.command, super::Command::Reload));

    let cli = Cli::try_parse_from(["guardianctl", "list-timers"]).unwrap();
    assert!(matches!(cli.command, super::Command::ListTimers));
}

#[test]
fn global_flags_apply_before_or_after_subcommand() {
    let cli = Cli::try_parse_from(["guardianctl", "-o", "json", "status"]).unwrap();
    assert_eq!(cli.output, crate::output::OutputFormat::Json);

    let cli =
        Cli::try_parse_from(["guardianctl", "--socket", "/tmp/x.sock", "status"]).unwrap();
    assert_eq!(cli.socket, Some(std::path::PathBuf::from("/tmp/x.sock")));
}

#[test]
fn grant_bonus_requires_two_positional_args() {
    assert!(Cli::try_parse_from(["guardianctl", "grant-bonus", "kid1"]).is_err());
}

#[test]
fn command_builds_without_panicking() {
    Cli::command().debug_assert();
}

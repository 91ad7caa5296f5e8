use crate::prelude::*;

#[test]
fn top_level_help_lists_every_subcommand() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("status")
        .stdout_has("list-kids")
        .stdout_has("get-quota")
        .stdout_has("grant-bonus")
        .stdout_has("reload")
        .stdout_has("list-timers");
}

#[test]
fn version_flag_prints_a_version() {
    cli().args(&["--version"]).passes().stdout_has("guardianctl");
}

#[test]
fn subcommand_help_describes_its_arguments() {
    cli()
        .args(&["grant-bonus", "--help"])
        .passes()
        .stdout_has("user")
        .stdout_has("minutes");
}

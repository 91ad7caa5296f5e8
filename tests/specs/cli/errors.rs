use crate::prelude::*;

#[test]
fn status_against_a_missing_socket_reports_daemon_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("guardian-daemon.sock");

    cli()
        .args(&["status"])
        .socket(&missing)
        .fails()
        .stderr_has("guardian-daemon is not running");
}

#[test]
fn get_quota_without_a_username_is_a_usage_error() {
    cli().args(&["get-quota"]).fails().stderr_has("required");
}

#[test]
fn grant_bonus_rejects_minutes_outside_the_valid_range() {
    // The range check happens client-side before any data crosses the
    // socket, so a listener that never accepts is enough — a real
    // connection attempt here would mean the test hangs, not passes.
    let dir = tempfile::tempdir().unwrap();
    let sock_path = dir.path().join("guardian-daemon.sock");
    let _listener = std::os::unix::net::UnixListener::bind(&sock_path).unwrap();

    cli()
        .args(&["grant-bonus", "kid1", "0"])
        .socket(&sock_path)
        .fails()
        .stderr_has("between 1 and 240");
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    cli().args(&["frobnicate"]).fails().stderr_has("error");
}

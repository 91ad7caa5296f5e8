use crate::prelude::*;
use guardian_daemon::{Request, Response, StatusInfo};

#[test]
fn status_prints_version_uptime_and_active_users() {
    let daemon = FakeDaemon::serve_one(
        Request::Status,
        Response::Status(StatusInfo { version: "0.1.0".to_string(), uptime_seconds: 5400, active_users: 2 }),
    );

    cli()
        .args(&["status"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_has("0.1.0")
        .stdout_has("1h30m")
        .stdout_has("active users: 2");
}

#[test]
fn status_json_output_is_parseable() {
    let daemon = FakeDaemon::serve_one(
        Request::Status,
        Response::Status(StatusInfo { version: "0.1.0".to_string(), uptime_seconds: 60, active_users: 0 }),
    );

    let out = cli()
        .args(&["-o", "json", "status"])
        .socket(daemon.socket_path())
        .passes()
        .stdout();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["active_users"], 0);
}

use crate::prelude::*;
use guardian_daemon::{QuotaInfo, Request, Response};

#[test]
fn get_quota_prints_quota_used_remaining_and_phase() {
    let daemon = FakeDaemon::serve_one(
        Request::GetQuota { user: "kid1".to_string() },
        Response::Quota(QuotaInfo {
            quota_seconds: 3600,
            used_seconds: 600,
            remaining_seconds: 3000,
            phase: "Normal".to_string(),
        }),
    );

    cli()
        .args(&["get-quota", "kid1"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_has("kid1")
        .stdout_has("1h00m")
        .stdout_has("Normal");
}

#[test]
fn get_quota_for_an_unmanaged_user_fails() {
    let daemon = FakeDaemon::serve_one(
        Request::GetQuota { user: "stranger".to_string() },
        Response::invalid_argument("'stranger' is not a managed user"),
    );

    cli()
        .args(&["get-quota", "stranger"])
        .socket(daemon.socket_path())
        .fails()
        .stderr_has("not a managed user");
}

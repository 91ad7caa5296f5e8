use crate::prelude::*;
use guardian_daemon::{Request, Response};

#[test]
fn grant_bonus_reports_the_grant() {
    let daemon = FakeDaemon::serve_one(
        Request::GrantBonus { user: "kid1".to_string(), minutes: 30 },
        Response::BonusGranted,
    );

    cli()
        .args(&["grant-bonus", "kid1", "30"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_eq("granted 30 bonus minute(s) to kid1\n");
}

#[test]
fn grant_bonus_surfaces_a_daemon_side_rejection() {
    let daemon = FakeDaemon::serve_one(
        Request::GrantBonus { user: "stranger".to_string(), minutes: 10 },
        Response::invalid_argument("'stranger' is not a managed user"),
    );

    cli()
        .args(&["grant-bonus", "stranger", "10"])
        .socket(daemon.socket_path())
        .fails()
        .stderr_has("not a managed user");
}

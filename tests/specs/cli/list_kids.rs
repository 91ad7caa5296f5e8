use crate::prelude::*;
use guardian_daemon::{Request, Response};

#[test]
fn list_kids_prints_each_managed_username() {
    let daemon = FakeDaemon::serve_one(
        Request::ListKids,
        Response::Kids { users: vec!["kid1".to_string(), "kid2".to_string()] },
    );

    cli()
        .args(&["list-kids"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_has("kid1")
        .stdout_has("kid2");
}

#[test]
fn list_kids_reports_an_empty_roster() {
    let daemon = FakeDaemon::serve_one(Request::ListKids, Response::Kids { users: vec![] });

    cli()
        .args(&["list-kids"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_has("no managed users");
}

use crate::prelude::*;
use guardian_daemon::{Request, Response};

#[test]
fn reload_reports_a_policy_change() {
    let daemon = FakeDaemon::serve_one(Request::Reload, Response::Reloaded { changed: true });

    cli()
        .args(&["reload"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_eq("config reloaded: policy changed\n");
}

#[test]
fn reload_reports_no_changes() {
    let daemon = FakeDaemon::serve_one(Request::Reload, Response::Reloaded { changed: false });

    cli()
        .args(&["reload"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_eq("config reloaded: no changes\n");
}

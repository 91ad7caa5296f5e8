use crate::prelude::*;
use guardian_daemon::{Request, Response, TimerInfo};

#[test]
fn list_timers_shows_unit_and_active_state() {
    let daemon = FakeDaemon::serve_one(
        Request::ListTimers,
        Response::Timers {
            units: vec![
                TimerInfo { unit: "guardian-daily-reset.timer".to_string(), active: true },
                TimerInfo { unit: "guardian-curfew@kid1.timer".to_string(), active: false },
            ],
        },
    );

    cli()
        .args(&["list-timers"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_has("guardian-daily-reset.timer")
        .stdout_has("guardian-curfew@kid1.timer");
}

#[test]
fn list_timers_reports_no_managed_units() {
    let daemon = FakeDaemon::serve_one(Request::ListTimers, Response::Timers { units: vec![] });

    cli()
        .args(&["list-timers"])
        .socket(daemon.socket_path())
        .passes()
        .stdout_has("no managed units");
}

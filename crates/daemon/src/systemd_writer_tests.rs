// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use guardian_config::test_support::snapshot_from_yaml;
use tempfile::tempdir;

fn policy_fixture() -> Policy {
    snapshot_from_yaml(
        r#"
timezone: "UTC"
reset_time: "03:00"
db_path: "/tmp/guardian.sqlite"
ipc_socket: "/tmp/guardian.sock"
notifications:
  pre_quota_minutes: [10]
  grace_period: { enabled: true, duration: 5, interval: 1 }
defaults:
  daily_quota_minutes: 90
  curfew: { weekdays: "08:00-20:00", saturday: "08:00-22:00", sunday: "09:00-20:00" }
  grace_minutes: 5
users:
  kid1:
    daily_quota_minutes: 60
    curfew: { weekdays: "07:30-19:30" }
"#,
    )
    .policy
}

#[test]
fn desired_units_includes_daily_reset_and_per_user_curfew() {
    let dir = tempdir().unwrap();
    let writer = SystemdWriter::new(dir.path().to_path_buf(), PathBuf::from("/usr/bin/guardiand"));
    let units = writer.desired_units(&policy_fixture());

    assert!(units.contains_key(DAILY_RESET_SERVICE));
    assert!(units.contains_key(DAILY_RESET_TIMER));
    assert!(units.contains_key("guardian-curfew@kid1.service"));
    assert!(units.contains_key("guardian-curfew@kid1.timer"));
}

#[test]
fn daily_reset_timer_oncalendar_matches_reset_time() {
    let dir = tempdir().unwrap();
    let writer = SystemdWriter::new(dir.path().to_path_buf(), PathBuf::from("/usr/bin/guardiand"));
    let units = writer.desired_units(&policy_fixture());

    let timer = &units[DAILY_RESET_TIMER];
    assert!(timer.contains("OnCalendar=*-*-* 03:00:00"));
    assert!(timer.contains("Persistent=true"));
}

#[test]
fn curfew_timer_fires_at_latest_window_end() {
    let dir = tempdir().unwrap();
    let writer = SystemdWriter::new(dir.path().to_path_buf(), PathBuf::from("/usr/bin/guardiand"));
    let units = writer.desired_units(&policy_fixture());

    let timer = &units["guardian-curfew@kid1.timer"];
    assert!(timer.contains("OnCalendar=*-*-* 19:30:00"));
}

#[test]
fn list_managed_units_only_picks_up_guardian_prefixed_files() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("guardian-daily-reset.timer"), "x").unwrap();
    std::fs::write(dir.path().join("unrelated.timer"), "x").unwrap();
    let writer = SystemdWriter::new(dir.path().to_path_buf(), PathBuf::from("/usr/bin/guardiand"));

    let found = writer.list_managed_units();
    assert_eq!(found, vec!["guardian-daily-reset.timer".to_string()]);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

const SAMPLE: &str = r#"
timezone: "Europe/Berlin"
reset_time: "03:00"
notifications:
  pre_quota_minutes: [15, 10, 5]
  grace_period: { enabled: true, duration: 5, interval: 1 }
defaults:
  daily_quota_minutes: 90
  curfew: { weekdays: "08:00-20:00" }
users:
  kid1: {}
"#;

const INVALID: &str = "timezone: \"Not/AZone\"\nusers:\n  kid1: {}\n";

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

#[test]
fn loads_the_documented_sample() {
    let f = write_temp(SAMPLE);
    let loader = ConfigLoader::load(f.path().to_path_buf()).unwrap();
    let snap = loader.current();
    assert!(snap.policy.is_managed("kid1"));
}

#[test]
fn cold_start_fails_on_invalid_config() {
    let f = write_temp(INVALID);
    assert!(ConfigLoader::load(f.path().to_path_buf()).is_err());
}

#[test]
fn unchanged_content_is_a_no_op_reload() {
    let f = write_temp(SAMPLE);
    let loader = ConfigLoader::load(f.path().to_path_buf()).unwrap();
    assert!(!loader.reload_once().unwrap());
}

#[test]
fn reload_keeps_prior_snapshot_on_parse_failure() {
    let f = write_temp(SAMPLE);
    let loader = ConfigLoader::load(f.path().to_path_buf()).unwrap();
    let before = loader.current();

    std::fs::write(f.path(), INVALID).unwrap();
    let result = loader.reload_once();

    assert!(result.is_err());
    let after = loader.current();
    assert_eq!(before.policy, after.policy);
}

#[test]
fn reload_publishes_and_notifies_subscribers_in_order() {
    let f = write_temp(SAMPLE);
    let loader = ConfigLoader::load(f.path().to_path_buf()).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));

    let order1 = order.clone();
    loader.subscribe(move |_snap| order1.lock().unwrap().push(1));
    let order2 = order.clone();
    let calls2 = calls.clone();
    loader.subscribe(move |_snap| {
        order2.lock().unwrap().push(2);
        calls2.fetch_add(1, Ordering::SeqCst);
    });

    let changed = r#"
timezone: "Europe/Berlin"
reset_time: "03:00"
defaults:
  daily_quota_minutes: 120
  curfew: { weekdays: "08:00-20:00" }
users:
  kid1: {}
  kid2: {}
"#;
    std::fs::write(f.path(), changed).unwrap();
    assert!(loader.reload_once().unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    assert!(loader.current().policy.is_managed("kid2"));
}

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
fn reconcile_creates_block_in_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("time.conf");
    let writer = PamWriter::new(path.clone(), "guardian-managed".to_string());

    writer.reconcile(&policy_fixture()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains(BLOCK_START));
    assert!(contents.contains(BLOCK_END));
    assert!(contents.contains("!@guardian-managed;Al0000-2400"));
    assert!(contents.contains("*;*;kid1;"));
}

#[test]
fn reconcile_preserves_lines_outside_the_block() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("time.conf");
    std::fs::write(&path, "# a pre-existing admin rule\n*;*;root;Al0000-2400\n").unwrap();
    let writer = PamWriter::new(path.clone(), "guardian-managed".to_string());

    writer.reconcile(&policy_fixture()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("# a pre-existing admin rule"));
    assert!(contents.contains("*;*;root;Al0000-2400"));
    assert!(contents.contains(BLOCK_START));
}

#[test]
fn reconcile_is_idempotent_on_unchanged_policy() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("time.conf");
    let writer = PamWriter::new(path.clone(), "guardian-managed".to_string());
    let policy = policy_fixture();

    writer.reconcile(&policy).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();
    writer.reconcile(&policy).unwrap();
    let second = std::fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn reconcile_replaces_a_stale_block_on_rerun() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("time.conf");
    let writer = PamWriter::new(path.clone(), "guardian-managed".to_string());

    writer.reconcile(&policy_fixture()).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();
    assert_eq!(before.matches(BLOCK_START).count(), 1);

    // Second reconcile against the same policy must not duplicate the block.
    writer.reconcile(&policy_fixture()).unwrap();
    let after = std::fs::read_to_string(&path).unwrap();
    assert_eq!(after.matches(BLOCK_START).count(), 1);
}

#[test]
fn default_permit_rule_is_always_well_formed() {
    let rule = "*;*;!@guardian-managed;Al0000-2400";
    assert!(validate_rule(rule).is_ok());
}

#[test]
fn malformed_rule_is_rejected() {
    assert!(validate_rule("*;*;kid1").is_err());
    assert!(validate_rule("*;*;kid1;Mo800-1930").is_err());
}

#[test]
fn backups_are_pruned_to_max_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("time.conf");
    let writer = PamWriter::new(path.clone(), "guardian-managed".to_string());

    for i in 0..(MAX_BACKUPS + 3) {
        std::fs::write(&path, format!("# revision {i}\n")).unwrap();
        writer.backup(&std::fs::read_to_string(&path).unwrap()).unwrap();
    }

    let backups: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
        .collect();
    assert!(backups.len() <= MAX_BACKUPS);
}

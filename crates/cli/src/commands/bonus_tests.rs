// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn rejects_minutes_below_range_without_contacting_daemon() {
    // A listener that never accepts proves the daemon was never contacted:
    // a validation failure must short-circuit before any connect attempt,
    // otherwise this test would hang waiting on a response.
    let dir = tempfile::tempdir().unwrap();
    let sock_path = dir.path().join("guardian-daemon.sock");
    let _listener = tokio::net::UnixListener::bind(&sock_path).unwrap();
    let client = DaemonClient::connect_to(sock_path).unwrap();

    let err = run(&client, "kid1", 0, OutputFormat::Text).await.unwrap_err();
    assert!(err.to_string().contains("between 1 and 240"));

    let err = run(&client, "kid1", 241, OutputFormat::Text).await.unwrap_err();
    assert!(err.to_string().contains("between 1 and 240"));
}

#[test]
fn text_render_reports_grant() {
    let out = render("kid1", 30, OutputFormat::Text);
    assert_eq!(out, "granted 30 bonus minute(s) to kid1\n");
}

#[test]
fn json_render_reports_grant() {
    let out = render("kid1", 30, OutputFormat::Json);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["user"], "kid1");
    assert_eq!(parsed["bonus_minutes"], 30);
    assert_eq!(parsed["granted"], true);
}

#[test]
fn range_constants_match_protocol_contract() {
    assert_eq!(MIN_MINUTES, 1);
    assert_eq!(MAX_MINUTES, 240);
}

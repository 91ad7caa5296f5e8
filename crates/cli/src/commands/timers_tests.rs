// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> Vec<TimerInfo> {
    vec![
        TimerInfo { unit: "guardian-daily-reset.timer".to_string(), active: true },
        TimerInfo { unit: "guardian-curfew@kid1.timer".to_string(), active: false },
    ]
}

#[test]
fn text_render_lists_all_units() {
    let out = render(&sample(), OutputFormat::Text);
    assert!(out.contains("guardian-daily-reset.timer"));
    assert!(out.contains("guardian-curfew@kid1.timer"));
}

#[test]
fn text_render_reports_empty_set() {
    let out = render(&[], OutputFormat::Text);
    assert_eq!(out, "(no managed units)\n");
}

#[test]
fn json_render_includes_active_flags() {
    let out = render(&sample(), OutputFormat::Json);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["units"][0]["active"], true);
    assert_eq!(parsed["units"][1]["active"], false);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn text_render_distinguishes_changed_from_unchanged() {
    assert_eq!(render(true, OutputFormat::Text), "config reloaded: policy changed\n");
    assert_eq!(render(false, OutputFormat::Text), "config reloaded: no changes\n");
}

#[test]
fn json_render_reports_changed_flag() {
    let out = render(true, OutputFormat::Json);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["changed"], true);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn error_messages_mention_loginctl_path() {
    let e = TerminatorError::Timeout(std::time::Duration::from_secs(10));
    assert!(format!("{e}").contains("timed out"));
}

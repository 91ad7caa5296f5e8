// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn first_delay_is_near_initial() {
    let mut b = ReconnectBackoff::default();
    let d = b.next_delay();
    assert!(d.as_secs_f64() >= 1.6 && d.as_secs_f64() <= 2.4);
}

#[test]
fn delay_grows_and_caps() {
    let mut b = ReconnectBackoff::default();
    for _ in 0..20 {
        let d = b.next_delay();
        assert!(d.as_secs_f64() <= 72.0); // 60s cap + 20% jitter
    }
}

#[test]
fn reset_returns_to_initial_scale() {
    let mut b = ReconnectBackoff::default();
    for _ in 0..5 {
        b.next_delay();
    }
    b.reset();
    let d = b.next_delay();
    assert!(d.as_secs_f64() <= 2.4);
}

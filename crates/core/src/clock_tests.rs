// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 3, 0, 0).unwrap()
}

#[test]
fn advance_moves_both_clocks() {
    let clock = FakeClock::new(epoch());
    let wall0 = clock.now_wall();
    let mono0 = clock.now_monotonic();

    clock.advance(std::time::Duration::from_secs(60));

    assert_eq!(clock.now_wall(), wall0 + chrono::Duration::seconds(60));
    assert!(clock.now_monotonic() >= mono0 + std::time::Duration::from_secs(60));
}

#[test]
fn set_wall_does_not_move_monotonic() {
    let clock = FakeClock::new(epoch());
    let mono0 = clock.now_monotonic();

    clock.set_wall(epoch() - chrono::Duration::days(2));

    assert_eq!(clock.now_monotonic(), mono0);
    assert!(clock.now_wall() < epoch());
}

#[test]
fn clones_share_state() {
    let clock = FakeClock::new(epoch());
    let clone = clock.clone();

    clock.advance(std::time::Duration::from_secs(10));

    assert_eq!(clock.now_wall(), clone.now_wall());
}

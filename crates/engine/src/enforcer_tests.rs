// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session_tracker::SessionTracker;
use chrono::TimeZone;
use guardian_adapters::{FakeNotifyAdapter, FakeTerminator};
use guardian_core::{
    CurfewWindow, Event, FakeClock, GraceConfig, NotificationPolicy, SessionId, WarnThresholds,
    Weekday,
};
use guardian_storage::Storage;
use std::collections::BTreeMap;
use std::time::Duration;

fn kid1() -> Username {
    Username::parse("kid1").unwrap()
}

fn policy_with(quota_seconds: u32, grace_seconds: u32, grace_enabled: bool, thresholds: Vec<u16>) -> Policy {
    let mut curfew = BTreeMap::new();
    for day in Weekday::ALL {
        curfew.insert(
            day,
            CurfewWindow {
                start: chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
                end: chrono::NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            },
        );
    }
    let user_policy = UserPolicy {
        daily_quota_seconds: quota_seconds,
        curfew: curfew.clone(),
        grace_seconds,
    };
    let mut users = BTreeMap::new();
    users.insert(kid1(), user_policy.clone());
    Policy {
        users,
        defaults: user_policy,
        notifications: NotificationPolicy {
            pre_quota_warn_minutes: WarnThresholds::new(thresholds),
            grace: GraceConfig {
                enabled: grace_enabled,
                duration_seconds: grace_seconds.max(60),
                interval_seconds: 60,
            },
        },
        reset_time: chrono::NaiveTime::from_hms_opt(3, 0, 0).unwrap(),
        timezone: chrono_tz::UTC,
    }
}

async fn new_session_tracker(clock: FakeClock) -> SessionTracker<FakeClock> {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let tracker = SessionTracker::new(clock.clone(), storage);
    tracker
        .handle_event(
            Event::NewSession {
                id: SessionId::new("s1"),
                username: kid1(),
                start_wall: clock.now_wall(),
            },
            chrono::NaiveTime::from_hms_opt(3, 0, 0).unwrap(),
            chrono_tz::UTC,
        )
        .await
        .unwrap();
    tracker
}

#[tokio::test]
async fn warns_at_threshold_and_marks_it_sent() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
    let tracker = new_session_tracker(clock.clone()).await;
    let policy = policy_with(600, 300, true, vec![5]);

    clock.advance(Duration::from_secs(600 - 5 * 60 + 1));
    tracker.tick().await.unwrap();

    let notifier = FakeNotifyAdapter::new();
    let terminator = FakeTerminator::new();
    let enforcer = Enforcer::new(clock.clone(), notifier.clone(), terminator);
    enforcer.tick(&tracker, &policy).await;

    assert_eq!(enforcer.phase_of("kid1"), Phase::Warning);
    assert_eq!(notifier.calls_for("kid1").len(), 1);
    assert!(notifier.calls_for("kid1")[0].title.contains('5'));
}

#[tokio::test]
async fn warning_phase_keeps_firing_later_smaller_thresholds() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
    let tracker = new_session_tracker(clock.clone()).await;
    let policy = policy_with(900, 300, true, vec![10, 5]);

    let notifier = FakeNotifyAdapter::new();
    let terminator = FakeTerminator::new();
    let enforcer = Enforcer::new(clock.clone(), notifier.clone(), terminator);

    // Cross the 10-minute threshold: Normal -> Warning, one notification.
    clock.advance(Duration::from_secs(900 - 10 * 60 + 1));
    tracker.tick().await.unwrap();
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Warning);
    assert_eq!(notifier.calls_for("kid1").len(), 1);
    assert!(notifier.calls_for("kid1")[0].title.contains("10"));

    // Cross the 5-minute threshold while still in Warning with time left.
    // Both thresholds must fire, not just the first one reached.
    clock.advance(Duration::from_secs(5 * 60));
    tracker.tick().await.unwrap();
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Warning);
    assert_eq!(notifier.calls_for("kid1").len(), 2);
    assert!(notifier.calls_for("kid1")[1].title.contains('5'));
}

#[tokio::test]
async fn warning_to_grace_to_terminating_on_exhaustion() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
    let tracker = new_session_tracker(clock.clone()).await;
    let policy = policy_with(60, 120, true, vec![1]);

    // Exhaust the whole quota in one jump.
    clock.advance(Duration::from_secs(60));
    tracker.tick().await.unwrap();

    let notifier = FakeNotifyAdapter::new();
    let terminator = FakeTerminator::new();
    let enforcer = Enforcer::new(clock.clone(), notifier.clone(), terminator.clone());

    // Tick 1: Normal -> Warning (threshold 1 minute fires immediately).
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Warning);

    // Tick 2: Warning -> Grace, since remaining is already 0 and grace enabled.
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Grace);

    // Advance past the grace duration: Grace -> Terminating, terminate issued.
    clock.advance(Duration::from_secs(121));
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Terminating);
    assert!(terminator.call_count_for("kid1") >= 1);
}

#[tokio::test]
async fn grace_disabled_skips_straight_to_terminating() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
    let tracker = new_session_tracker(clock.clone()).await;
    let policy = policy_with(60, 0, false, vec![1]);

    clock.advance(Duration::from_secs(60));
    tracker.tick().await.unwrap();

    let notifier = FakeNotifyAdapter::new();
    let terminator = FakeTerminator::new();
    let enforcer = Enforcer::new(clock.clone(), notifier, terminator.clone());

    enforcer.tick(&tracker, &policy).await; // Normal -> Warning
    enforcer.tick(&tracker, &policy).await; // Warning -> Terminating (no grace)
    assert_eq!(enforcer.phase_of("kid1"), Phase::Terminating);
    assert!(terminator.call_count_for("kid1") >= 1);
}

#[tokio::test]
async fn terminating_moves_to_terminated_once_sessions_close() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
    let tracker = new_session_tracker(clock.clone()).await;
    let policy = policy_with(60, 0, false, vec![1]);

    clock.advance(Duration::from_secs(60));
    tracker.tick().await.unwrap();

    let notifier = FakeNotifyAdapter::new();
    let terminator = FakeTerminator::new();
    let enforcer = Enforcer::new(clock.clone(), notifier, terminator);

    enforcer.tick(&tracker, &policy).await;
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Terminating);

    tracker
        .handle_event(
            Event::RemovedSession { id: SessionId::new("s1"), at: clock.now_wall() },
            chrono::NaiveTime::from_hms_opt(3, 0, 0).unwrap(),
            chrono_tz::UTC,
        )
        .await
        .unwrap();

    // The user has no active session anymore, but tick() must still pick
    // them up while Terminating so the phase can settle to Terminated.
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Terminated);
}

#[tokio::test]
async fn does_not_skip_normal_straight_to_terminating_when_grace_enabled() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
    let tracker = new_session_tracker(clock.clone()).await;
    let policy = policy_with(60, 120, true, vec![1]);
    clock.advance(Duration::from_secs(60));
    tracker.tick().await.unwrap();

    let notifier = FakeNotifyAdapter::new();
    let terminator = FakeTerminator::new();
    let enforcer = Enforcer::new(clock.clone(), notifier, terminator.clone());

    enforcer.tick(&tracker, &policy).await; // Normal -> Warning only
    assert_eq!(enforcer.phase_of("kid1"), Phase::Warning);
    assert_eq!(terminator.call_count_for("kid1"), 0);
}

#[tokio::test]
async fn day_rollover_resets_phase_and_notified_thresholds() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
    let tracker = new_session_tracker(clock.clone()).await;
    let policy = policy_with(600, 300, true, vec![5]);

    clock.advance(Duration::from_secs(600 - 5 * 60 + 1));
    tracker.tick().await.unwrap();

    let notifier = FakeNotifyAdapter::new();
    let terminator = FakeTerminator::new();
    let enforcer = Enforcer::new(clock.clone(), notifier.clone(), terminator);
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(enforcer.phase_of("kid1"), Phase::Warning);

    enforcer.on_day_rolled_over();
    assert_eq!(enforcer.phase_of("kid1"), Phase::Normal);

    // Same threshold should be free to fire again after the reset.
    enforcer.tick(&tracker, &policy).await;
    assert_eq!(notifier.calls_for("kid1").len(), 2);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives the per-user warning/grace/terminate state machine from
//! SessionTracker's usage snapshots, delivering notifications and
//! termination commands through the adapters crate's traits.

use chrono::{DateTime, Utc};
use guardian_adapters::{NotifyAdapter, Terminator, Urgency};
use guardian_core::{Clock, EnforcementState, Phase, Policy, UserPolicy, Username};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::session_tracker::SessionTracker;

/// Default cadence for `Enforcer::tick`, independent of SessionTracker's
/// own tick interval.
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

pub struct Enforcer<C: Clock, N: NotifyAdapter, T: Terminator> {
    clock: C,
    notifier: N,
    terminator: T,
    states: Mutex<HashMap<Username, EnforcementState>>,
}

impl<C: Clock, N: NotifyAdapter, T: Terminator> Enforcer<C, N, T> {
    pub fn new(clock: C, notifier: N, terminator: T) -> Self {
        Self {
            clock,
            notifier,
            terminator,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluates the state machine for every user with at least one active
    /// session, plus any user still parked in `Terminating` after their
    /// last session closed — otherwise that user would drop out of
    /// iteration before ever observing its own empty session list and
    /// would stay stuck mid-termination forever. Call at `TICK_INTERVAL`
    /// cadence and after every tracker event that could move
    /// `remaining_seconds`.
    pub async fn tick(&self, tracker: &SessionTracker<C>, policy: &Policy) {
        let mut users = tracker.active_managed_users().await;
        let pending_termination: Vec<Username> = self
            .states
            .lock()
            .iter()
            .filter(|(_, s)| s.phase == Phase::Terminating)
            .map(|(u, _)| u.clone())
            .collect();
        for username in pending_termination {
            if !users.contains(&username) {
                users.push(username);
            }
        }
        for username in users {
            let Some(user_policy) = policy.user_policy(username.as_str()) else {
                continue;
            };
            let remaining = tracker
                .remaining_seconds(username.as_str(), user_policy.daily_quota_seconds)
                .await;
            self.evaluate_one(tracker, &username, user_policy, policy, remaining)
                .await;
        }
    }

    /// Resets every tracked user back to `Normal` at a UsageDay boundary.
    pub fn on_day_rolled_over(&self) {
        for state in self.states.lock().values_mut() {
            state.reset_for_new_day();
        }
    }

    pub fn phase_of(&self, username: &str) -> Phase {
        self.states
            .lock()
            .get(username)
            .map(|s| s.phase)
            .unwrap_or(Phase::Normal)
    }

    async fn evaluate_one(
        &self,
        tracker: &SessionTracker<C>,
        username: &Username,
        user_policy: &UserPolicy,
        policy: &Policy,
        remaining: f64,
    ) {
        let now = self.clock.now_wall();
        let phase = self.states.lock().entry(username.clone()).or_default().phase;

        match phase {
            Phase::Normal => self.evaluate_normal(username, policy, remaining).await,
            Phase::Warning => self.evaluate_warning(username, policy, remaining, now).await,
            Phase::Grace => self.evaluate_grace(username, user_policy, policy, now).await,
            Phase::Terminating => self.evaluate_terminating(tracker, username).await,
            Phase::Terminated => self.evaluate_terminated(tracker, username).await,
        }
    }

    /// Sends the next not-yet-delivered pre-quota warning if
    /// `remaining`'s minute-ceiling has crossed one, marking every
    /// threshold at or above it as sent in the same pass so a later tick
    /// never re-fires an already-crossed one. Returns whether a warning
    /// went out.
    async fn send_next_threshold_warning(&self, username: &Username, policy: &Policy, remaining: f64) -> bool {
        let thresholds = policy.notifications.pre_quota_warn_minutes.as_slice();
        let remaining_minutes = (remaining / 60.0).ceil() as u16;

        let next = {
            let states = self.states.lock();
            states
                .get(username)
                .and_then(|s| s.next_unnotified_threshold(remaining_minutes, thresholds))
        };
        let Some(winning_threshold) = next else {
            return false;
        };

        let title = format!("{winning_threshold} minutes left");
        let _ = self
            .notifier
            .notify(username, &title, "Your screen time is almost up.", Urgency::Normal)
            .await;

        let mut states = self.states.lock();
        let state = states.entry(username.clone()).or_default();
        for threshold in thresholds {
            if remaining_minutes <= *threshold {
                state.notified_thresholds.insert(*threshold);
            }
        }
        true
    }

    async fn evaluate_normal(&self, username: &Username, policy: &Policy, remaining: f64) {
        if !self.send_next_threshold_warning(username, policy, remaining).await {
            return;
        }
        let mut states = self.states.lock();
        states.entry(username.clone()).or_default().phase = Phase::Warning;
    }

    async fn evaluate_warning(&self, username: &Username, policy: &Policy, remaining: f64, now: DateTime<Utc>) {
        if remaining > 0.0 {
            // Still above zero: there may be a later, smaller threshold
            // (e.g. 10 then 5 minutes left) still unnotified. Stay in
            // Warning either way — only remaining <= 0 advances the phase.
            self.send_next_threshold_warning(username, policy, remaining).await;
            return;
        }
        if policy.notifications.grace.enabled {
            let _ = self
                .notifier
                .notify(username, "Grace period started", "Time is up; wrapping up soon.", Urgency::Critical)
                .await;
            let mut states = self.states.lock();
            let state = states.entry(username.clone()).or_default();
            state.phase = Phase::Grace;
            state.grace_started_at = Some(now);
            state.last_grace_tick_at = Some(now);
        } else {
            self.enter_terminating(username).await;
        }
    }

    async fn evaluate_grace(&self, username: &Username, user_policy: &UserPolicy, policy: &Policy, now: DateTime<Utc>) {
        let (grace_started_at, last_grace_tick_at) = {
            let states = self.states.lock();
            let state = states.get(username);
            (
                state.and_then(|s| s.grace_started_at),
                state.and_then(|s| s.last_grace_tick_at),
            )
        };
        let Some(grace_started_at) = grace_started_at else {
            return;
        };

        // A per-user grace override (if set) takes precedence over the
        // global notifications.grace duration, the same override-or-default
        // shape `resolve_override` applies to quota and curfew.
        let duration_seconds = if user_policy.grace_seconds > 0 {
            user_policy.grace_seconds
        } else {
            policy.notifications.grace.duration_seconds
        };
        let duration = chrono::Duration::seconds(duration_seconds as i64);
        if now - grace_started_at >= duration {
            self.enter_terminating(username).await;
            return;
        }

        let interval = chrono::Duration::seconds(policy.notifications.grace.interval_seconds.max(1) as i64);
        let due = last_grace_tick_at.map(|t| now - t >= interval).unwrap_or(true);
        if due {
            let _ = self
                .notifier
                .notify(username, "Still in grace period", "Please finish up now.", Urgency::Critical)
                .await;
            let mut states = self.states.lock();
            if let Some(state) = states.get_mut(username) {
                state.last_grace_tick_at = Some(now);
            }
        }
    }

    async fn evaluate_terminating(&self, tracker: &SessionTracker<C>, username: &Username) {
        if tracker.sessions_of(username.as_str()).await.is_empty() {
            let mut states = self.states.lock();
            if let Some(state) = states.get_mut(username) {
                state.phase = Phase::Terminated;
            }
            return;
        }
        if let Err(e) = self.terminator.terminate_user(username).await {
            tracing::error!(%username, error = %e, "terminate_user failed; user remains in Terminating");
        }
    }

    async fn evaluate_terminated(&self, tracker: &SessionTracker<C>, username: &Username) {
        // A managed user can still hold a curfew-permitted session after
        // being terminated (PAM gates the curfew window, not the quota).
        // Kick them right back out rather than silently re-entering Normal.
        if !tracker.sessions_of(username.as_str()).await.is_empty() {
            if let Err(e) = self.terminator.terminate_user(username).await {
                tracing::error!(%username, error = %e, "re-terminate of Terminated user failed");
            }
        }
    }

    async fn enter_terminating(&self, username: &Username) {
        {
            let mut states = self.states.lock();
            let state = states.entry(username.clone()).or_default();
            state.phase = Phase::Terminating;
        }
        if let Err(e) = self.terminator.terminate_user(username).await {
            tracing::error!(%username, error = %e, "initial terminate_user failed; will retry next tick");
        }
    }
}

#[cfg(test)]
#[path = "enforcer_tests.rs"]
mod tests;

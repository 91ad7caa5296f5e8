// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the external systems Guardian-Daemon talks to: the session
//! bus (LoginSource), the per-user notification agent, and the OS session
//! terminator.

mod env;
pub mod login;
pub mod notify;
pub mod subprocess;
pub mod terminator;

pub use login::{FilteringLoginSource, LoginSourceAdapter, LogindLoginSource, ReconnectBackoff};
pub use notify::{
    DbusAgentNotifyAdapter, DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError,
    Urgency,
};
pub use terminator::{SystemTerminator, Terminator, TerminatorError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use login::FakeLoginSource;
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use terminator::{FakeTerminator, TerminateCall};

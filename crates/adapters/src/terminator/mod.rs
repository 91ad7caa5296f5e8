// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminates a managed user's login sessions.
//!
//! Preferred path is `TerminateUser(uid)` on `org.freedesktop.login1`;
//! `loginctl terminate-user` is the fallback when the bus call is
//! unavailable. Retries (3x, 5s apart) live here, inside the adapter, so
//! Enforcer only ever makes one call per tick and reads the `Result`.

mod logind;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use logind::SystemTerminator;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTerminator, TerminateCall};

use async_trait::async_trait;
use guardian_core::Username;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminatorError {
    #[error("terminate-user timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("terminate-user failed: {0}")]
    Failed(String),
}

/// Ends all of a user's login sessions.
#[async_trait]
pub trait Terminator: Send + Sync + 'static {
    async fn terminate_user(&self, username: &Username) -> Result<(), TerminatorError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated username type.
//!
//! Every managed username passes through [`Username::parse`] before it is
//! allowed to reach a PAM rule, a systemd unit name, or a D-Bus path
//! fragment — the single chokepoint that prevents path/command injection
//! usernames must satisfy downstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn pattern() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("valid regex"))
}

/// Error returned when a candidate username fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid username '{0}': must match ^[a-z_][a-z0-9_-]{{0,31}}$")]
pub struct InvalidUsername(pub String);

/// A username that has already passed the `^[a-z_][a-z0-9_-]{0,31}$` check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn parse(candidate: impl Into<String>) -> Result<Self, InvalidUsername> {
        let candidate = candidate.into();
        if pattern().is_match(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(InvalidUsername(candidate))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = InvalidUsername;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for Username {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Username {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
#[path = "username_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! guardian-config: load, validate, and hot-reload the daemon's YAML
//! configuration into an immutable `Snapshot`.
//!
//! The previously accepted snapshot always remains in force across a
//! reload failure — [`ConfigLoader`] never adopts an invalid one.

mod error;
mod loader;
mod raw;
mod snapshot;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_path, ConfigLoader, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DEFAULT_RELOAD_INTERVAL};
pub use snapshot::Snapshot;
pub use validate::GlobalPaths;

#[cfg(feature = "test-support")]
pub mod test_support {
    //! Helpers for other crates' tests that need a `Snapshot` without a
    //! filesystem round-trip.
    use crate::raw::RawConfig;
    use crate::snapshot::Snapshot;
    use crate::validate::validate;

    /// Builds a `Snapshot` directly from a YAML string, panicking on any
    /// parse or validation failure — intended for test fixtures only.
    pub fn snapshot_from_yaml(yaml: &str) -> Snapshot {
        let raw: RawConfig = serde_yaml::from_str(yaml).expect("valid yaml fixture");
        let (policy, paths) = validate(raw).expect("valid policy fixture");
        Snapshot::new(policy, paths)
    }
}

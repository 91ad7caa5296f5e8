// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types surfaced by the engine crate.

use thiserror::Error;

/// Errors from SessionTracker and Enforcer operations.
///
/// Every variant here is handled at the component boundary by logging and
/// degrading to permissive behavior — see `guardian-daemon`'s wiring of
/// these into structured log events. Nothing in this crate ever panics on
/// a storage hiccup or a missing policy entry.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] guardian_storage::StorageError),
    #[error("unmanaged username: {0}")]
    UnmanagedUser(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! guardian-storage: the daemon's SQLite-backed durability layer.
//!
//! Everything here is built around [`executor::AsyncConnection`], a single
//! dedicated thread that owns the `rusqlite::Connection` — rusqlite itself
//! is not `Send` across an `.await`, and SQLite serializes writers anyway,
//! so one thread is both necessary and sufficient.

mod error;
mod executor;
mod migrations;
mod store;

pub use error::{StorageError, StorageResult};
pub use executor::AsyncConnection;
pub use migrations::CURRENT_VERSION;
pub use store::Storage;

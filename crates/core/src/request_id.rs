// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation identifier for AdminIpc request/response pairs and their
//! log lines.

crate::define_id! {
    /// Identifies one AdminIpc request across the request and response log
    /// lines that describe it.
    pub struct RequestId;
}

impl RequestId {
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
#[path = "request_id_tests.rs"]
mod tests;

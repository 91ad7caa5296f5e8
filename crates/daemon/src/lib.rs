// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! guardian-daemon library surface
//!
//! Exposes the admin IPC wire protocol so `guardianctl` and other clients
//! can encode/decode requests without depending on the binary crate.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod protocol;

pub use protocol::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    QuotaInfo, Request, Response, StatusInfo, TimerInfo, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE,
    PROTOCOL_VERSION,
};

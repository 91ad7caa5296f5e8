// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin IPC protocol.
//!
//! Wire format: 4-byte big-endian length prefix + JSON body, one request
//! producing exactly one response. Bodies over `MAX_MESSAGE_SIZE` are
//! rejected without closing the connection.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// A request an administrator sends over the admin socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Request {
    /// Daemon version, uptime, active-user count.
    Status,
    /// Usernames currently under management.
    ListKids,
    /// One managed user's quota/usage/phase.
    GetQuota { user: String },
    /// Grants extra minutes to a user's budget for the current UsageDay.
    /// `minutes` must be in `[1, 240]`.
    GrantBonus { user: String, minutes: u32 },
    /// Triggers an immediate configuration reload.
    Reload,
    /// Enumerates managed systemd units and their state.
    ListTimers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub version: String,
    pub uptime_seconds: u64,
    pub active_users: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaInfo {
    pub quota_seconds: u32,
    pub used_seconds: u32,
    pub remaining_seconds: u32,
    pub phase: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerInfo {
    pub unit: String,
    pub active: bool,
}

/// A response the daemon sends back for one `Request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Status(StatusInfo),
    Kids { users: Vec<String> },
    Quota(QuotaInfo),
    BonusGranted,
    Reloaded { changed: bool },
    Timers { units: Vec<TimerInfo> },
    Error { error: String, detail: Option<String> },
}

impl Response {
    pub fn unknown_command() -> Self {
        Response::Error {
            error: "unknown_command".to_string(),
            detail: None,
        }
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Response::Error {
            error: "invalid_argument".to_string(),
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,
}

/// Maximum request/response body size.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Reads a length-prefixed frame. A frame over `MAX_MESSAGE_SIZE` has its
/// body drained from the stream before the error is returned, so the
/// connection stays usable for the caller's next request instead of
/// desyncing framing.
pub async fn read_message<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        drain(reader, len).await?;
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Discards `len` bytes in fixed-size chunks so rejecting an oversized
/// frame never requires a `len`-sized allocation.
async fn drain<R: AsyncReadExt + Unpin>(reader: &mut R, mut len: usize) -> Result<(), ProtocolError> {
    let mut chunk = [0u8; 8192];
    while len > 0 {
        let n = chunk.len().min(len);
        reader.read_exact(&mut chunk[..n]).await?;
        len -= n;
    }
    Ok(())
}

pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed frame under `timeout`, without decoding it.
/// Lets a caller tell a framing/IO failure (drop the connection) apart
/// from a JSON decode failure (reply with an error instead).
pub async fn read_request_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Vec<u8>, ProtocolError> {
    tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

pub async fn read_request<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    let bytes = read_request_frame(reader, timeout).await?;
    decode(&bytes)
}

pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

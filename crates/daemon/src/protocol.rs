// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between `smd` and its clients.
//!
//! Each message is a JSON document preceded by a 4-byte big-endian length.
//! A connection carries exactly one request and one response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sm_core::unit::deserialize_present;
use sm_core::{Movement, Profile, Snapshot, StorageUnit};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Protocol version reported by `Hello`
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for reading or writing one message
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest accepted message body
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Request from a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,
    Hello {
        version: String,
    },
    Status,
    Shutdown,

    Login {
        login: String,
        password: String,
    },
    Session {
        token: String,
    },
    Logout {
        token: String,
    },

    ListUnits {
        token: String,
    },
    CreateUnit {
        token: String,
        unit: UnitPayload,
    },

    ListMovements {
        token: String,
        #[serde(default)]
        limit: Option<u32>,
    },
    RecordMovement {
        token: String,
        movement: MovementPayload,
    },
}

impl Request {
    /// Name used in logs. Never includes credentials or tokens.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::Hello { .. } => "hello",
            Request::Status => "status",
            Request::Shutdown => "shutdown",
            Request::Login { .. } => "auth.login",
            Request::Session { .. } => "auth.session",
            Request::Logout { .. } => "auth.logout",
            Request::ListUnits { .. } => "storage.list",
            Request::CreateUnit { .. } => "storage.create",
            Request::ListMovements { .. } => "movements.list",
            Request::RecordMovement { .. } => "movements.record",
        }
    }

    /// Session token carried by the request, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            Request::Session { token }
            | Request::Logout { token }
            | Request::ListUnits { token }
            | Request::CreateUnit { token, .. }
            | Request::ListMovements { token, .. }
            | Request::RecordMovement { token, .. } => Some(token),
            _ => None,
        }
    }
}

/// Unvalidated storage unit fields as sent by a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitPayload {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    /// Kept as raw JSON so a wrong type is reported as a violation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub metadata: Option<Value>,
}

/// Unvalidated movement fields as sent by a client.
///
/// There is no actor field; an `actor` key is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovementPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub item_label: Option<String>,
    #[serde(default)]
    pub from_unit: Option<String>,
    #[serde(default)]
    pub to_unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// An authenticated session as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub token: String,
    pub profile: Profile,
    pub snapshot: Snapshot,
}

/// Failure category carried by `Response::Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Auth,
    Throttled,
    Integrity,
    Store,
}

/// Response from the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Hello {
        version: String,
    },
    Status {
        uptime_secs: u64,
        sessions_active: usize,
    },
    ShuttingDown,
    Ok,

    Session {
        session: SessionInfo,
    },
    Units {
        units: Vec<StorageUnit>,
    },
    UnitCreated {
        unit: StorageUnit,
        snapshot: Snapshot,
    },
    Movements {
        movements: Vec<Movement>,
    },
    MovementRecorded {
        movement: Movement,
        snapshot: Snapshot,
    },

    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Serialize a message to JSON bytes (no length prefix)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserialize a message from JSON bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write one length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = u32::try_from(data.len()).map_err(|_| ProtocolError::MessageTooLarge {
        size: data.len(),
        max: MAX_MESSAGE_SIZE,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    Ok(data)
}

/// Read and decode a request, giving up after `timeout`
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Encode and write a response, giving up after `timeout`
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sm-daemon: the shelfmark archive daemon (`smd`)
//!
//! The library half holds what clients share with the daemon: the wire
//! protocol, the request validation layer, the service that implements the
//! operation surface, and the filesystem layout.

pub mod dispatch;
pub mod paths;
pub mod protocol;
pub mod service;
pub mod validate;

pub use dispatch::dispatch;
pub use protocol::{
    ErrorKind, MovementPayload, ProtocolError, Request, Response, SessionInfo, UnitPayload,
};
pub use service::{Archive, ServiceError};

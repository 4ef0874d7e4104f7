// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sm-core: domain model for the shelfmark archive tracker
//!
//! This crate provides:
//! - Storage units, movements, accounts and the aggregate snapshot
//! - Clock and token generator abstractions
//! - The in-memory session manager and login throttle

pub mod account;
pub mod clock;
pub mod error;
pub mod id;
pub mod limits;
pub mod movement;
pub mod session;
pub mod snapshot;
pub mod unit;

pub use account::{normalize_login, Credentials, Profile, Role};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{SessionError, ValidationError};
pub use id::{SequentialTokenGen, TokenGen, UuidTokenGen};
pub use limits::{LoginLimits, LoginThrottle, Throttled};
pub use movement::{
    clamp_limit, Movement, NewMovement, DEFAULT_MOVEMENT_LIMIT, MAX_MOVEMENT_LIMIT,
    REGISTRATION_ACTION,
};
pub use session::{Session, SessionManager};
pub use snapshot::Snapshot;
pub use unit::{NewStorageUnit, StorageUnit, UnitKind};

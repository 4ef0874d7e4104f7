// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Encrypted local store for shelfmark
//!
//! One SQLite handle, owned by [`Store`], behind a mutex. Every write is
//! serialized through it, and migrations run before the handle is shared.

mod credentials;
mod error;
mod ledger;
mod migrate;
mod movements;
mod snapshot;
mod store;

pub use credentials::{
    hash_password, BootstrapOutcome, BootstrapPolicy, DefaultAccount,
};
pub use error::StoreError;
pub use migrate::{Migration, MIGRATIONS};
pub use store::{Store, StoreConfig};

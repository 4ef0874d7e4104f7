// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store handle, configuration and shared row helpers

use crate::error::StoreError;
use crate::migrate;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use sm_core::{Clock, SystemClock};
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Plaintext hashed once at open so that unknown logins cost a full bcrypt
/// verification, same as known ones
const DUMMY_PASSWORD: &str = "shelfmark-no-such-account";

/// Store configuration
#[derive(Clone)]
pub struct StoreConfig {
    /// Encryption key, applied with `PRAGMA key` before anything else
    pub key: Option<String>,
    /// bcrypt cost factor for new password hashes
    pub bcrypt_cost: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// The persisted store: credentials, storage units and movements
pub struct Store<C = SystemClock> {
    conn: Mutex<Connection>,
    pub(crate) clock: C,
    pub(crate) bcrypt_cost: u32,
    pub(crate) dummy_hash: String,
}

impl<C: Clock> Store<C> {
    /// Open or create a store at the given path and bring its schema up to date.
    ///
    /// Any migration failure is returned as an error; callers treat it as fatal.
    pub fn open(path: &Path, config: &StoreConfig, clock: C) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self::init(conn, config, clock)?;
        tracing::info!(path = %path.display(), encrypted = config.key.is_some(), "store opened");
        Ok(store)
    }

    /// Open a private in-memory store (tests, dry runs)
    pub fn open_in_memory(config: &StoreConfig, clock: C) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, config, clock)
    }

    fn init(mut conn: Connection, config: &StoreConfig, clock: C) -> Result<Self, StoreError> {
        if let Some(key) = &config.key {
            conn.pragma_update(None, "key", key)?;
        }
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        // Migrations run while we still own the only handle, so nothing
        // can interleave with them.
        migrate::apply(&mut conn, &clock)?;

        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, config.bcrypt_cost)?;

        Ok(Self {
            conn: Mutex::new(conn),
            clock,
            bcrypt_cost: config.bcrypt_cost,
            dummy_hash,
        })
    }

    /// Exclusive access to the connection
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current time formatted for storage
    pub(crate) fn now(&self) -> String {
        format_timestamp(self.clock.now())
    }
}

/// Timestamps are stored as fixed-width RFC 3339 UTC strings so that text
/// order equals chronological order.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. Also accepts SQLite's `CURRENT_TIMESTAMP` form,
/// which older stores used as a column default.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| conversion_error(idx, format!("invalid timestamp: {}", raw)))
}

/// Read a text column and parse it with `FromStr`
pub(crate) fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_error(idx, e))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot aggregator

use crate::error::StoreError;
use crate::movements::latest_movement;
use crate::store::{format_timestamp, parsed_column, Store};
use rusqlite::params;
use sm_core::{Clock, Snapshot, UnitKind};

impl<C: Clock> Store<C> {
    /// Recompute the summary from the current ledger and log.
    ///
    /// All three reads happen under one lock, so no write can land between them.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let (start, end) = self.clock.today_bounds();
        let conn = self.lock();

        let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM storage_units GROUP BY type")?;
        let counts = stmt
            .query_map([], |row| {
                let kind = parsed_column::<UnitKind>(row, 0)?;
                let count: i64 = row.get(1)?;
                Ok((kind, u64::try_from(count).unwrap_or(0)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let today: i64 = conn.query_row(
            "SELECT COUNT(*) FROM movements WHERE created_at >= ?1 AND created_at < ?2",
            params![format_timestamp(start), format_timestamp(end)],
            |row| row.get(0),
        )?;

        let last = latest_movement(&conn)?;
        Ok(Snapshot::from_counts(
            counts,
            u64::try_from(today).unwrap_or(0),
            last,
        ))
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

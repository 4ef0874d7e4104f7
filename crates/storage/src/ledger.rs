// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage ledger: registration and listing of storage units

use crate::error::StoreError;
use crate::movements::insert_movement;
use crate::store::{conversion_error, parsed_column, timestamp_column, Store};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use sm_core::{Clock, NewMovement, NewStorageUnit, StorageUnit, UnitKind};

pub(crate) const UNIT_COLUMNS: &str =
    "id, label, type, section, capacity, occupancy, metadata, created_at, updated_at";

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    let raw: Option<i64> = row.get(idx)?;
    u32::try_from(raw.unwrap_or(0)).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn unit_row(row: &Row<'_>) -> rusqlite::Result<StorageUnit> {
    let metadata = row
        .get::<_, Option<String>>(6)?
        .map(|raw| serde_json::from_str::<Value>(&raw))
        .transpose()
        .map_err(|e| conversion_error(6, e))?;
    Ok(StorageUnit {
        id: row.get(0)?,
        label: row.get(1)?,
        kind: parsed_column::<UnitKind>(row, 2)?,
        section: row.get(3)?,
        capacity: count_column(row, 4)?,
        occupancy: count_column(row, 5)?,
        metadata,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}

pub(crate) fn find_unit(conn: &Connection, id: i64) -> rusqlite::Result<Option<StorageUnit>> {
    conn.query_row(
        &format!("SELECT {} FROM storage_units WHERE id = ?1", UNIT_COLUMNS),
        [id],
        unit_row,
    )
    .optional()
}

impl<C: Clock> Store<C> {
    /// All storage units, most recently updated first
    pub fn list_units(&self) -> Result<Vec<StorageUnit>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM storage_units ORDER BY updated_at DESC, id DESC",
            UNIT_COLUMNS
        ))?;
        let units = stmt
            .query_map([], unit_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(units)
    }

    /// Register a storage unit with zero occupancy.
    ///
    /// The registration movement, authored by `actor`, is appended in the
    /// same transaction.
    pub fn create_unit(&self, unit: &NewStorageUnit, actor: &str) -> Result<StorageUnit, StoreError> {
        let metadata = unit.metadata.as_ref().map(serde_json::to_string).transpose()?;
        let now = self.now();

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO storage_units
                (label, type, section, capacity, occupancy, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?6)",
            params![
                unit.label,
                unit.kind.as_str(),
                unit.section,
                unit.capacity,
                metadata,
                now
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = find_unit(&tx, id)?.ok_or(StoreError::Integrity {
            kind: "storage unit",
            id,
        })?;
        insert_movement(&tx, actor, &NewMovement::registration(&created.label), &now)?;
        tx.commit()?;

        tracing::info!(unit_id = id, label = %created.label, kind = %created.kind, "storage unit registered");
        Ok(created)
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;

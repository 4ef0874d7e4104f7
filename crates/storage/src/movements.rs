// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Movement log: append-only journal of actions on storage units
//!
//! Rows are never updated or deleted. Occupancy of the
//! referenced units follows movements that carry an item: the destination
//! gains one, the origin loses one (never below zero).

use crate::error::StoreError;
use crate::store::{timestamp_column, Store};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sm_core::{Clock, Movement, NewMovement};

const MOVEMENT_COLUMNS: &str =
    "id, reference, item_label, from_unit, to_unit, action, note, actor, created_at";

fn movement_row(row: &Row<'_>) -> rusqlite::Result<Movement> {
    Ok(Movement {
        id: row.get(0)?,
        reference: row.get(1)?,
        item_label: row.get(2)?,
        from_unit: row.get(3)?,
        to_unit: row.get(4)?,
        action: row.get(5)?,
        note: row.get(6)?,
        actor: row.get(7)?,
        created_at: timestamp_column(row, 8)?,
    })
}

pub(crate) fn latest_movement(conn: &Connection) -> rusqlite::Result<Option<Movement>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM movements ORDER BY created_at DESC, id DESC LIMIT 1",
            MOVEMENT_COLUMNS
        ),
        [],
        movement_row,
    )
    .optional()
}

/// Append a movement and apply its occupancy effect. Callers own the
/// surrounding transaction.
pub(crate) fn insert_movement(
    conn: &Connection,
    actor: &str,
    movement: &NewMovement,
    now: &str,
) -> Result<Movement, StoreError> {
    conn.execute(
        "INSERT INTO movements
            (reference, item_label, from_unit, to_unit, action, note, actor, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            movement.reference,
            movement.item_label,
            movement.from_unit,
            movement.to_unit,
            movement.action,
            movement.note,
            actor,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();
    let recorded = conn
        .query_row(
            &format!("SELECT {} FROM movements WHERE id = ?1", MOVEMENT_COLUMNS),
            [id],
            movement_row,
        )
        .optional()?
        .ok_or(StoreError::Integrity {
            kind: "movement",
            id,
        })?;

    if movement.moves_item() {
        if let Some(to) = &movement.to_unit {
            adjust_occupancy(conn, to, 1, now)?;
        }
        if let Some(from) = &movement.from_unit {
            adjust_occupancy(conn, from, -1, now)?;
        }
    }
    Ok(recorded)
}

/// Add `delta` to the occupancy of every unit whose label matches,
/// ignoring case and surrounding whitespace.
fn adjust_occupancy(conn: &Connection, label: &str, delta: i64, now: &str) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE storage_units
         SET occupancy = MAX(occupancy + ?2, 0), updated_at = ?3
         WHERE LOWER(TRIM(label)) = LOWER(TRIM(?1))",
        params![label, delta, now],
    )?;
    if changed == 0 {
        tracing::debug!(label, "movement references no registered unit");
        return Ok(());
    }

    if delta > 0 {
        let mut stmt = conn.prepare(
            "SELECT id, capacity, occupancy FROM storage_units
             WHERE LOWER(TRIM(label)) = LOWER(TRIM(?1)) AND occupancy > capacity",
        )?;
        let over = stmt.query_map([label], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?;
        for entry in over {
            let (unit_id, capacity, occupancy) = entry?;
            tracing::warn!(unit_id, capacity, occupancy, "storage unit over capacity");
        }
    }
    Ok(())
}

impl<C: Clock> Store<C> {
    /// Most recent movements first, at most `limit` of them
    pub fn list_movements(&self, limit: u32) -> Result<Vec<Movement>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM movements ORDER BY created_at DESC, id DESC LIMIT ?1",
            MOVEMENT_COLUMNS
        ))?;
        let movements = stmt
            .query_map([limit], movement_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(movements)
    }

    /// Append a movement authored by `actor`
    pub fn record_movement(&self, actor: &str, movement: &NewMovement) -> Result<Movement, StoreError> {
        let now = self.now();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let recorded = insert_movement(&tx, actor, movement, &now)?;
        tx.commit()?;

        tracing::info!(movement_id = recorded.id, action = %recorded.action, actor, "movement recorded");
        Ok(recorded)
    }
}

#[cfg(test)]
#[path = "movements_tests.rs"]
mod tests;

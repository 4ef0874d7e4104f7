// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrator
//!
//! Migrations are an ordered list of steps. Each step runs in its own
//! transaction and is recorded in `schema_migrations` inside that same
//! transaction, so a step is either fully applied and recorded or neither.
//! Steps are also written to be safe on stores that predate the marker
//! table: they create only what is absent and repair only what they detect.

use crate::error::StoreError;
use crate::store::format_timestamp;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use sm_core::{Clock, UnitKind};
use std::collections::HashSet;

/// One schema step
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    run: fn(&Transaction<'_>) -> rusqlite::Result<()>,
}

/// Every schema step, in application order
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "adopt legacy users table",
        run: adopt_users_table,
    },
    Migration {
        version: 2,
        name: "create tables",
        run: create_tables,
    },
    Migration {
        version: 3,
        name: "rename email column to login",
        run: rename_email_column,
    },
    Migration {
        version: 4,
        name: "add ordering indexes",
        run: add_indexes,
    },
    Migration {
        version: 5,
        name: "normalize legacy unit types",
        run: normalize_unit_types,
    },
    Migration {
        version: 6,
        name: "normalize legacy timestamps",
        run: normalize_timestamps,
    },
];

const MARKER_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Apply every pending migration. Returns the versions applied by this call.
pub(crate) fn apply<C: Clock>(conn: &mut Connection, clock: &C) -> Result<Vec<u32>, StoreError> {
    conn.execute_batch(MARKER_TABLE)?;
    let done = applied_versions(conn)?;

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        if done.contains(&migration.version) {
            continue;
        }
        apply_one(conn, migration, clock).map_err(|e| StoreError::Migration {
            version: migration.version,
            name: migration.name,
            source: Box::new(e),
        })?;
        tracing::info!(version = migration.version, name = migration.name, "migration applied");
        applied.push(migration.version);
    }
    Ok(applied)
}

fn apply_one<C: Clock>(
    conn: &mut Connection,
    migration: &Migration,
    clock: &C,
) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    (migration.run)(&tx)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, format_timestamp(clock.now())],
    )?;
    tx.commit()?;
    Ok(())
}

pub(crate) fn applied_versions(conn: &Connection) -> rusqlite::Result<HashSet<u32>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt.query_map([], |row| row.get(0))?;
    versions.collect()
}

fn table_exists(tx: &Transaction<'_>, table: &str) -> rusqlite::Result<bool> {
    tx.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

fn column_names(tx: &Transaction<'_>, table: &str) -> rusqlite::Result<Vec<String>> {
    // PRAGMA arguments cannot be bound; callers only pass fixed table names.
    let mut stmt = tx.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    names.collect()
}

/// Older stores kept credentials in a `users` table
fn adopt_users_table(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    if table_exists(tx, "users")? && !table_exists(tx, "credentials")? {
        tx.execute_batch("ALTER TABLE users RENAME TO credentials")?;
    }
    Ok(())
}

fn create_tables(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS credentials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            login TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'admin',
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS storage_units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            label TEXT NOT NULL,
            type TEXT NOT NULL,
            section TEXT,
            capacity INTEGER NOT NULL DEFAULT 0,
            occupancy INTEGER NOT NULL DEFAULT 0,
            metadata TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS movements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reference TEXT,
            item_label TEXT,
            from_unit TEXT,
            to_unit TEXT,
            action TEXT NOT NULL,
            note TEXT,
            actor TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    )
}

/// Rename the legacy `email` identifier column exactly once, detected by
/// introspection rather than by version so pre-marker stores are covered.
fn rename_email_column(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    let columns = column_names(tx, "credentials")?;
    let has = |name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));
    if has("email") && !has("login") {
        tx.execute_batch("ALTER TABLE credentials RENAME COLUMN email TO login")?;
    }
    Ok(())
}

fn add_indexes(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_movements_created_at ON movements (created_at);
         CREATE INDEX IF NOT EXISTS idx_storage_units_updated_at ON storage_units (updated_at);",
    )
}

/// Kind given to legacy rows whose type has no current counterpart
const FALLBACK_UNIT_KIND: UnitKind = UnitKind::Folder;

fn normalize_unit_types(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "UPDATE storage_units SET type = 'FOLDER' WHERE UPPER(type) = 'PASTA';
         UPDATE storage_units SET type = 'CABINET' WHERE UPPER(type) = 'GAVETEIRO';
         UPDATE storage_units SET type = 'BOX' WHERE UPPER(type) = 'CAIXA';
         UPDATE storage_units SET type = UPPER(TRIM(type)) WHERE type <> UPPER(TRIM(type));",
    )?;

    let known: Vec<String> = UnitKind::ALL
        .iter()
        .map(|kind| format!("'{}'", kind.as_str()))
        .collect();
    let mut stmt = tx.prepare(&format!(
        "SELECT id, label, type FROM storage_units WHERE type NOT IN ({})",
        known.join(", ")
    ))?;
    let unknown = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (id, label, legacy) in unknown {
        tracing::warn!(
            id,
            label = %label,
            legacy_type = %legacy,
            fallback = %FALLBACK_UNIT_KIND,
            "unknown legacy unit type"
        );
        tx.execute(
            "UPDATE storage_units SET type = ?1 WHERE id = ?2",
            params![FALLBACK_UNIT_KIND.as_str(), id],
        )?;
    }
    Ok(())
}

/// Rewrite `CURRENT_TIMESTAMP` values into the stored RFC 3339 form so that
/// text ordering stays chronological across old and new rows.
fn normalize_timestamps(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    for (table, column) in [
        ("credentials", "created_at"),
        ("storage_units", "created_at"),
        ("storage_units", "updated_at"),
        ("movements", "created_at"),
    ] {
        tx.execute_batch(&format!(
            "UPDATE {table} SET {column} = strftime('%Y-%m-%dT%H:%M:%S', {column}) || '.000000Z'
             WHERE {column} NOT LIKE '%T%' AND strftime('%Y-%m-%dT%H:%M:%S', {column}) IS NOT NULL"
        ))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "migrate_tests.rs"]
mod tests;

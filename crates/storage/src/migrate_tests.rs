// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::{Store, StoreConfig};
use sm_core::{FakeClock, UnitKind};
use tempfile::tempdir;

fn all_versions() -> Vec<u32> {
    MIGRATIONS.iter().map(|m| m.version).collect()
}

fn columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap()
}

fn test_config() -> StoreConfig {
    StoreConfig {
        key: None,
        bcrypt_cost: 4,
    }
}

#[test]
fn versions_are_strictly_increasing() {
    let versions = all_versions();
    assert!(versions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(versions.first(), Some(&1));
}

#[test]
fn fresh_database_applies_every_step_once() {
    let mut conn = Connection::open_in_memory().unwrap();
    let clock = FakeClock::new();

    assert_eq!(apply(&mut conn, &clock).unwrap(), all_versions());
    assert!(apply(&mut conn, &clock).unwrap().is_empty());

    let recorded: Vec<u32> = {
        let mut versions: Vec<u32> = applied_versions(&conn).unwrap().into_iter().collect();
        versions.sort_unstable();
        versions
    };
    assert_eq!(recorded, all_versions());

    for table in ["credentials", "storage_units", "movements"] {
        assert!(!columns(&conn, table).is_empty(), "{} missing", table);
    }
}

#[test]
fn steps_are_idempotent_without_the_marker_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    let clock = FakeClock::new();
    apply(&mut conn, &clock).unwrap();

    // Forget the bookkeeping: every step must still succeed a second time.
    conn.execute_batch("DELETE FROM schema_migrations").unwrap();
    assert_eq!(apply(&mut conn, &clock).unwrap(), all_versions());
}

#[test]
fn legacy_users_table_with_email_column_is_repaired() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'admin',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO users (name, email, password_hash, role)
                VALUES ('Ana', 'ana@archive.local', 'x', 'admin');",
        )
        .unwrap();
    }

    let store = Store::open(&path, &test_config(), FakeClock::new()).unwrap();
    assert_eq!(store.credential_count().unwrap(), 1);
    drop(store);

    let conn = Connection::open(&path).unwrap();
    let cols = columns(&conn, "credentials");
    assert!(cols.contains(&"login".to_string()));
    assert!(!cols.contains(&"email".to_string()));
    let login: String = conn
        .query_row("SELECT login FROM credentials", [], |row| row.get(0))
        .unwrap();
    assert_eq!(login, "ana@archive.local");
}

#[test]
fn legacy_unit_types_and_timestamps_are_normalized() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE storage_units (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                type TEXT NOT NULL,
                section TEXT,
                capacity INTEGER DEFAULT 0,
                occupancy INTEGER DEFAULT 0,
                metadata TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO storage_units (label, type, created_at, updated_at) VALUES
                ('A', 'pasta', '2024-03-01 10:00:00', '2024-03-01 10:00:00'),
                ('B', 'GAVETEIRO', '2024-03-02 10:00:00', '2024-03-02 10:00:00'),
                ('C', 'Caixa', '2024-03-03 10:00:00', '2024-03-03 10:00:00'),
                ('D', 'envelope', '2024-03-04 10:00:00', '2024-03-04 10:00:00');",
        )
        .unwrap();
    }

    let store = Store::open(&path, &test_config(), FakeClock::new()).unwrap();
    let units = store.list_units().unwrap();
    let kinds: Vec<(String, UnitKind)> = units.iter().map(|u| (u.label.clone(), u.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("D".to_string(), UnitKind::Envelope),
            ("C".to_string(), UnitKind::Box),
            ("B".to_string(), UnitKind::Cabinet),
            ("A".to_string(), UnitKind::Folder),
        ]
    );
    drop(store);

    let conn = Connection::open(&path).unwrap();
    let created: String = conn
        .query_row("SELECT created_at FROM storage_units WHERE label = 'A'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(created, "2024-03-01T10:00:00.000000Z");
}

#[test]
fn unknown_legacy_unit_types_fall_back_and_stay_readable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE storage_units (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                type TEXT NOT NULL,
                section TEXT,
                capacity INTEGER DEFAULT 0,
                occupancy INTEGER DEFAULT 0,
                metadata TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO storage_units (label, type, created_at, updated_at) VALUES
                ('A', 'ARQUIVO', '2024-03-01 10:00:00', '2024-03-01 10:00:00'),
                ('B', 'PASTA', '2024-03-02 10:00:00', '2024-03-02 10:00:00'),
                ('C', '', '2024-03-03 10:00:00', '2024-03-03 10:00:00');",
        )
        .unwrap();
    }

    let store = Store::open(&path, &test_config(), FakeClock::new()).unwrap();
    let kinds: Vec<(String, UnitKind)> = store
        .list_units()
        .unwrap()
        .into_iter()
        .map(|u| (u.label, u.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("C".to_string(), FALLBACK_UNIT_KIND),
            ("B".to_string(), UnitKind::Folder),
            ("A".to_string(), FALLBACK_UNIT_KIND),
        ]
    );

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.total_units, 3);
    assert_eq!(snapshot.units_of(FALLBACK_UNIT_KIND), 3);
}

#[test]
fn reopening_a_store_applies_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.db");
    drop(Store::open(&path, &test_config(), FakeClock::new()).unwrap());

    let mut conn = Connection::open(&path).unwrap();
    assert!(apply(&mut conn, &FakeClock::new()).unwrap().is_empty());
}

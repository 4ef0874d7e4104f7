// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use sm_core::{FakeClock, LoginLimits, Role, SequentialTokenGen, UnitKind, REGISTRATION_ACTION};
use sm_storage::StoreConfig;

struct Fixture {
    archive: Archive<SequentialTokenGen, FakeClock>,
    clock: FakeClock,
}

fn fixture() -> Fixture {
    let clock = FakeClock::new();
    let config = StoreConfig {
        key: None,
        bcrypt_cost: 4,
    };
    let store = Store::open_in_memory(&config, clock.clone()).unwrap();
    store
        .add_credential("Ana Souza", "jdoe", "correct horse", Role::Admin)
        .unwrap();
    let archive = Archive::new(
        store,
        SessionManager::new(SequentialTokenGen::default(), clock.clone()),
        LoginThrottle::new(LoginLimits::default(), clock.clone()),
    );
    Fixture { archive, clock }
}

fn creds(login: &str, password: &str) -> Credentials {
    Credentials {
        login: login.to_string(),
        password: password.to_string(),
    }
}

fn login(archive: &Archive<SequentialTokenGen, FakeClock>) -> String {
    archive
        .login(&creds("jdoe", "correct horse"))
        .unwrap()
        .token
}

#[test]
fn login_session_logout_round_trip() {
    let Fixture { archive, .. } = fixture();

    let issued = archive.login(&creds("JDoe", "correct horse")).unwrap();
    assert_eq!(issued.token, "token-1");
    assert_eq!(issued.profile.name, "Ana Souza");

    let resumed = archive.session(&issued.token).unwrap();
    assert_eq!(resumed.profile, issued.profile);
    assert_eq!(resumed.snapshot, issued.snapshot);

    archive.logout(&issued.token);
    let err = archive.session(&issued.token).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.to_string(), "invalid session");
}

#[test]
fn prefix_fallback_login() {
    let Fixture { archive, .. } = fixture();
    let issued = archive
        .login(&creds("jdoe@old-domain", "correct horse"))
        .unwrap();
    assert_eq!(issued.profile.login, "jdoe");
}

#[test]
fn bad_credentials_are_uninformative() {
    let Fixture { archive, .. } = fixture();
    let wrong_password = archive.login(&creds("jdoe", "nope")).unwrap_err();
    let unknown_login = archive.login(&creds("nobody", "correct horse")).unwrap_err();

    assert_eq!(wrong_password.kind(), ErrorKind::Auth);
    assert_eq!(unknown_login.kind(), ErrorKind::Auth);
    assert_eq!(wrong_password.to_string(), unknown_login.to_string());
}

#[test]
fn repeated_failures_are_throttled_until_window_passes() {
    let Fixture { archive, clock } = fixture();
    for _ in 0..5 {
        let err = archive.login(&creds("jdoe", "nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    // Throttled even with the right password.
    let err = archive.login(&creds("jdoe", "correct horse")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Throttled);

    clock.advance(chrono::Duration::seconds(61));
    assert!(archive.login(&creds("jdoe", "correct horse")).is_ok());
}

#[test]
fn protected_operations_require_a_session() {
    let Fixture { archive, .. } = fixture();
    let unit = NewStorageUnit::new("Box-1", UnitKind::Box);
    let movement = NewMovement::new("transfer");

    let failures = [
        archive.list_units("forged").unwrap_err(),
        archive.create_unit("forged", &unit).unwrap_err(),
        archive.list_movements("", None).unwrap_err(),
        archive.record_movement("forged", &movement).unwrap_err(),
    ];
    for err in failures {
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    // Nothing was written.
    let token = login(&archive);
    assert!(archive.list_units(&token).unwrap().is_empty());
    assert!(archive.list_movements(&token, None).unwrap().is_empty());
}

#[test]
fn created_unit_is_listed_with_fresh_snapshot() {
    let Fixture { archive, .. } = fixture();
    let token = login(&archive);

    let new = NewStorageUnit::new("Cabinet-01", UnitKind::Cabinet)
        .with_capacity(30)
        .with_metadata(json!({ "shelf": 3 }));
    let (unit, snapshot) = archive.create_unit(&token, &new).unwrap();
    assert_eq!(unit.occupancy, 0);
    assert_eq!(unit.capacity, 30);
    assert_eq!(snapshot.units_of(UnitKind::Cabinet), 1);
    assert_eq!(snapshot.total_units, 1);

    let listed = archive.list_units(&token).unwrap();
    assert_eq!(listed, vec![unit]);
    assert_eq!(listed[0].metadata, Some(json!({ "shelf": 3 })));
}

#[test]
fn end_to_end_registration_scenario() {
    let Fixture { archive, .. } = fixture();
    let token = login(&archive);

    archive
        .create_unit(
            &token,
            &NewStorageUnit::new("Cabinet-01", UnitKind::Cabinet).with_capacity(30),
        )
        .unwrap();
    let (movement, snapshot) = archive
        .record_movement(&token, &NewMovement::new(REGISTRATION_ACTION).to_unit("Cabinet-01"))
        .unwrap();

    assert_eq!(movement.actor, "Ana Souza");
    assert_eq!(snapshot.units_of(UnitKind::Cabinet), 1);
    let last = snapshot.last_movement.unwrap();
    assert_eq!(last.action, REGISTRATION_ACTION);
    assert_eq!(last.id, movement.id);
}

#[test]
fn actor_comes_from_the_session() {
    let Fixture { archive, .. } = fixture();
    let token = login(&archive);
    let (movement, _) = archive
        .record_movement(&token, &NewMovement::new("inspected").reference("REQ-1"))
        .unwrap();
    assert_eq!(movement.actor, "Ana Souza");
}

#[test]
fn movement_list_defaults_to_twenty_five() {
    let Fixture { archive, clock } = fixture();
    let token = login(&archive);
    for i in 0..30 {
        clock.advance(chrono::Duration::seconds(1));
        archive
            .record_movement(&token, &NewMovement::new(format!("step {}", i)))
            .unwrap();
    }

    assert_eq!(archive.list_movements(&token, None).unwrap().len(), 25);
    assert_eq!(archive.list_movements(&token, Some(3)).unwrap().len(), 3);
    assert_eq!(archive.list_movements(&token, Some(0)).unwrap().len(), 1);
    let newest = &archive.list_movements(&token, Some(1)).unwrap()[0];
    assert_eq!(newest.action, "step 29");
}

#[test]
fn revoke_all_ends_every_session() {
    let Fixture { archive, .. } = fixture();
    let first = login(&archive);
    let second = login(&archive);
    assert_ne!(first, second);
    assert_eq!(archive.sessions_active(), 2);

    assert_eq!(archive.revoke_all(), 2);
    assert!(archive.session(&first).is_err());
    assert!(archive.session(&second).is_err());
}

#[test]
fn store_errors_map_to_kinds() {
    let integrity: ServiceError = StoreError::Integrity {
        kind: "movement",
        id: 7,
    }
    .into();
    assert_eq!(integrity.kind(), ErrorKind::Integrity);

    let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let store: ServiceError = StoreError::Json(malformed).into();
    assert_eq!(store.kind(), ErrorKind::Store);
    assert_eq!(store.to_string(), "store failure");
}

#[test]
fn failed_login_reply_leaves_no_session_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let clock = FakeClock::new();
    let config = StoreConfig {
        key: None,
        bcrypt_cost: 4,
    };
    let store = Store::open(&path, &config, clock.clone()).unwrap();
    store
        .add_credential("Ana Souza", "jdoe", "correct horse", Role::Admin)
        .unwrap();
    let archive = Archive::new(
        store,
        SessionManager::new(SequentialTokenGen::default(), clock.clone()),
        LoginThrottle::new(LoginLimits::default(), clock),
    );

    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("DROP TABLE movements")
        .unwrap();

    let err = archive.login(&creds("jdoe", "correct horse")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);
    assert_eq!(archive.sessions_active(), 0);
}

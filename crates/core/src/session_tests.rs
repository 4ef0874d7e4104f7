// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::account::Role;
use crate::clock::FakeClock;
use crate::id::SequentialTokenGen;
use std::sync::Arc;

fn profile(login: &str) -> Profile {
    Profile {
        id: 1,
        name: "Administrator".to_string(),
        login: login.to_string(),
        role: Role::Admin,
    }
}

fn manager() -> SessionManager<SequentialTokenGen, FakeClock> {
    SessionManager::new(SequentialTokenGen::new("tok"), FakeClock::new())
}

#[test]
fn create_then_get_returns_same_profile() {
    let sessions = manager();
    let session = sessions.create(profile("admin"));

    assert_eq!(session.token, "tok-1");
    let found = sessions.get(&session.token).unwrap();
    assert_eq!(found.profile, profile("admin"));
    assert_eq!(found, session);
}

#[test]
fn require_fails_for_unknown_token() {
    let sessions = manager();
    assert_eq!(sessions.require("nope"), Err(SessionError::Invalid));
}

#[test]
fn revoke_invalidates_token() {
    let sessions = manager();
    let session = sessions.create(profile("admin"));

    assert!(sessions.revoke(&session.token));
    assert_eq!(sessions.require(&session.token), Err(SessionError::Invalid));
    assert!(!sessions.revoke(&session.token));
}

#[test]
fn revoke_leaves_other_sessions() {
    let sessions = manager();
    let first = sessions.create(profile("admin"));
    let second = sessions.create(profile("clerk"));

    sessions.revoke(&first.token);
    assert_eq!(sessions.require(&second.token).unwrap().profile.login, "clerk");
}

#[test]
fn revoke_all_clears_table() {
    let sessions = manager();
    sessions.create(profile("a"));
    sessions.create(profile("b"));

    assert_eq!(sessions.revoke_all(), 2);
    assert!(sessions.is_empty());
}

#[test]
fn issued_at_comes_from_clock() {
    let clock = FakeClock::new();
    let sessions = SessionManager::new(SequentialTokenGen::default(), clock.clone());
    let session = sessions.create(profile("admin"));
    assert_eq!(session.issued_at, clock.now());
}

/// Hands out the same token twice before moving on
#[derive(Clone, Default)]
struct StutteringGen {
    calls: Arc<std::sync::atomic::AtomicU64>,
}

impl TokenGen for StutteringGen {
    fn next(&self) -> String {
        let n = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n < 2 {
            "fixed".to_string()
        } else {
            format!("tok-{}", n)
        }
    }
}

#[test]
fn colliding_tokens_are_skipped() {
    let sessions = SessionManager::new(StutteringGen::default(), FakeClock::new());
    let first = sessions.create(profile("a"));
    let second = sessions.create(profile("b"));

    assert_eq!(first.token, "fixed");
    assert_eq!(second.token, "tok-2");
    assert_eq!(sessions.require("fixed").unwrap().profile.login, "a");
}

#[test]
fn concurrent_creation_yields_unique_tokens() {
    let sessions = Arc::new(SessionManager::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sessions = Arc::clone(&sessions);
            std::thread::spawn(move || {
                (0..25)
                    .map(|_| sessions.create(profile("admin")).token)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut tokens: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), 200);
    assert_eq!(sessions.len(), 200);
}

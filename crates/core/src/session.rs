// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session manager
//!
//! Sessions are held only in memory: a process restart invalidates every
//! token. The token table is shared by concurrent requests, so all access
//! goes through a mutex.

use crate::account::Profile;
use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;
use crate::id::{TokenGen, UuidTokenGen};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    /// Copy of the credential's public fields taken at issuance
    pub profile: Profile,
    pub issued_at: DateTime<Utc>,
}

/// Issues, validates and revokes session tokens
pub struct SessionManager<G = UuidTokenGen, C = SystemClock> {
    tokens: G,
    clock: C,
    sessions: Mutex<HashMap<String, Session>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(UuidTokenGen, SystemClock)
    }
}

impl<G: TokenGen, C: Clock> SessionManager<G, C> {
    pub fn new(tokens: G, clock: C) -> Self {
        Self {
            tokens,
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a new session for the profile
    pub fn create(&self, profile: Profile) -> Session {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());

        let mut token = self.tokens.next();
        while sessions.contains_key(&token) {
            token = self.tokens.next();
        }

        let session = Session {
            token: token.clone(),
            profile,
            issued_at: self.clock.now(),
        };
        sessions.insert(token, session.clone());

        tracing::info!(login = %session.profile.login, "session issued");
        session
    }

    /// Look up a session by token
    pub fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(token).cloned()
    }

    /// Look up a session, failing when the token is unknown.
    ///
    /// Every protected operation calls this first.
    pub fn require(&self, token: &str) -> Result<Session, SessionError> {
        self.get(token).ok_or(SessionError::Invalid)
    }

    /// Revoke a single token. Returns whether it was active.
    pub fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.remove(token) {
            Some(session) => {
                tracing::info!(login = %session.profile.login, "session revoked");
                true
            }
            None => false,
        }
    }

    /// Revoke every session. Returns how many were active.
    pub fn revoke_all(&self) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let count = sessions.len();
        sessions.clear();
        if count > 0 {
            tracing::info!(count, "all sessions revoked");
        }
        count
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

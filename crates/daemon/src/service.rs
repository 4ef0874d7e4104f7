// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The archive service: the authenticated operation surface.
//!
//! Every operation except login starts at the session gate. Every mutation
//! returns a snapshot computed after the write, never a cached one.

use crate::protocol::{ErrorKind, SessionInfo};
use sm_core::{
    clamp_limit, Clock, Credentials, LoginThrottle, Movement, NewMovement, NewStorageUnit,
    Session, SessionError, SessionManager, Snapshot, StorageUnit, SystemClock, Throttled,
    TokenGen, UuidTokenGen, ValidationError,
};
use sm_storage::{Store, StoreError};
use thiserror::Error;

/// Service errors. Messages for auth and store failures carry no detail.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Throttled(#[from] Throttled),

    #[error("internal integrity failure")]
    Integrity(#[source] StoreError),

    #[error("store failure")]
    Store(#[source] StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::InvalidCredentials | ServiceError::Session(_) => ErrorKind::Auth,
            ServiceError::Throttled(_) => ErrorKind::Throttled,
            ServiceError::Integrity(_) => ErrorKind::Integrity,
            ServiceError::Store(_) => ErrorKind::Store,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store operation failed");
        match err {
            StoreError::Integrity { .. } => ServiceError::Integrity(err),
            other => ServiceError::Store(other),
        }
    }
}

/// Storage units, movements and sessions behind one handle
pub struct Archive<G = UuidTokenGen, C = SystemClock> {
    store: Store<C>,
    sessions: SessionManager<G, C>,
    throttle: LoginThrottle<C>,
}

impl<G: TokenGen, C: Clock> Archive<G, C> {
    pub fn new(store: Store<C>, sessions: SessionManager<G, C>, throttle: LoginThrottle<C>) -> Self {
        Self {
            store,
            sessions,
            throttle,
        }
    }

    fn info(&self, session: Session) -> Result<SessionInfo, ServiceError> {
        Ok(SessionInfo {
            token: session.token,
            profile: session.profile,
            snapshot: self.store.snapshot()?,
        })
    }

    /// auth.login
    pub fn login(&self, credentials: &Credentials) -> Result<SessionInfo, ServiceError> {
        self.throttle.check(&credentials.login)?;

        let Some(profile) = self
            .store
            .verify_login(&credentials.login, &credentials.password)?
        else {
            tracing::warn!(login = %credentials.login, "login rejected");
            return Err(ServiceError::InvalidCredentials);
        };

        self.throttle.clear(&credentials.login);
        // A token is only issued once the reply can be built.
        let snapshot = self.store.snapshot()?;
        let session = self.sessions.create(profile);
        Ok(SessionInfo {
            token: session.token,
            profile: session.profile,
            snapshot,
        })
    }

    /// auth.session
    pub fn session(&self, token: &str) -> Result<SessionInfo, ServiceError> {
        let session = self.sessions.require(token)?;
        self.info(session)
    }

    /// auth.logout. Unknown tokens are not an error.
    pub fn logout(&self, token: &str) {
        self.sessions.revoke(token);
    }

    /// storage.list
    pub fn list_units(&self, token: &str) -> Result<Vec<StorageUnit>, ServiceError> {
        self.sessions.require(token)?;
        Ok(self.store.list_units()?)
    }

    /// storage.create
    pub fn create_unit(
        &self,
        token: &str,
        unit: &NewStorageUnit,
    ) -> Result<(StorageUnit, Snapshot), ServiceError> {
        let session = self.sessions.require(token)?;
        let created = self.store.create_unit(unit, &session.profile.name)?;
        Ok((created, self.store.snapshot()?))
    }

    /// movements.list
    pub fn list_movements(
        &self,
        token: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Movement>, ServiceError> {
        self.sessions.require(token)?;
        Ok(self.store.list_movements(clamp_limit(limit))?)
    }

    /// movements.record. The actor is the session's profile name.
    pub fn record_movement(
        &self,
        token: &str,
        movement: &NewMovement,
    ) -> Result<(Movement, Snapshot), ServiceError> {
        let session = self.sessions.require(token)?;
        let recorded = self.store.record_movement(&session.profile.name, movement)?;
        Ok((recorded, self.store.snapshot()?))
    }

    pub fn sessions_active(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every session; used on shutdown
    pub fn revoke_all(&self) -> usize {
        self.sessions.revoke_all()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login attempt throttling.
//!
//! Attempts are counted per normalized login within a fixed window that
//! starts at the first attempt. Counting happens before credentials are
//! checked, so a throttled response says nothing about whether the login
//! exists.

use crate::account::normalize_login;
use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Entries are pruned once the table grows past this size
const PRUNE_THRESHOLD: usize = 1024;

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct LoginLimits {
    /// Attempts allowed per window
    pub max_attempts: u32,
    /// Window length, measured from the first attempt
    pub window: Duration,
}

impl Default for LoginLimits {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::seconds(60),
        }
    }
}

/// Rejection from the throttle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("too many login attempts; retry in {retry_after_secs} seconds")]
pub struct Throttled {
    pub retry_after_secs: i64,
}

/// Per-login attempt counter
pub struct LoginThrottle<C = SystemClock> {
    limits: LoginLimits,
    clock: C,
    attempts: Mutex<HashMap<String, (u32, DateTime<Utc>)>>,
}

impl<C: Clock> LoginThrottle<C> {
    pub fn new(limits: LoginLimits, clock: C) -> Self {
        Self {
            limits,
            clock,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Count an attempt for `login`, rejecting it once the window is exhausted
    pub fn check(&self, login: &str) -> Result<(), Throttled> {
        let now = self.clock.now();
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

        if attempts.len() > PRUNE_THRESHOLD {
            let window = self.limits.window;
            attempts.retain(|_, (_, started)| now - *started <= window);
        }

        let entry = attempts.entry(normalize_login(login)).or_insert((0, now));
        if now - entry.1 > self.limits.window {
            *entry = (1, now);
            return Ok(());
        }

        entry.0 += 1;
        if entry.0 > self.limits.max_attempts {
            let retry_after = (entry.1 + self.limits.window - now).num_seconds().max(1);
            tracing::warn!(attempts = entry.0, "login throttled");
            return Err(Throttled {
                retry_after_secs: retry_after,
            });
        }
        Ok(())
    }

    /// Forget attempts for `login` (after a successful login)
    pub fn clear(&self, login: &str) {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts.remove(&normalize_login(login));
    }
}

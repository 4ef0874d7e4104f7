// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Duration;
use fs2::FileExt;
use sm_core::{LoginLimits, LoginThrottle, SessionManager, SystemClock, UuidTokenGen};
use sm_daemon::paths;
use sm_daemon::Archive;
use sm_storage::{BootstrapOutcome, BootstrapPolicy, DefaultAccount, Store, StoreConfig, StoreError};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// State directory (store, log, pid, version)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the store database
    pub store_path: PathBuf,
    pub store: StoreConfig,
    /// Account guaranteed to exist after startup, if configured
    pub default_account: Option<DefaultAccount>,
    pub bootstrap: BootstrapPolicy,
    pub limits: LoginLimits,
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, LifecycleError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LifecycleError::InvalidConfig { var, value }),
    }
}

impl Config {
    /// Resolve configuration from the process environment
    pub fn from_env(state_dir: Option<PathBuf>) -> Result<Self, LifecycleError> {
        let state_dir = state_dir
            .or_else(paths::state_dir)
            .ok_or(LifecycleError::NoStateDir)?;
        Self::load(state_dir, |var| std::env::var(var).ok())
    }

    /// Resolve configuration for a state directory, reading variables through `lookup`
    pub fn load(
        state_dir: PathBuf,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LifecycleError> {
        let bcrypt_cost = match parse_var::<u32>(&lookup, "SM_BCRYPT_COST")? {
            Some(cost) if (4..=31).contains(&cost) => cost,
            Some(cost) => {
                return Err(LifecycleError::InvalidConfig {
                    var: "SM_BCRYPT_COST",
                    value: cost.to_string(),
                })
            }
            None => StoreConfig::default().bcrypt_cost,
        };

        let mut limits = LoginLimits::default();
        if let Some(max) = parse_var::<u32>(&lookup, "SM_LOGIN_MAX_ATTEMPTS")? {
            limits.max_attempts = max;
        }
        if let Some(secs) = parse_var::<i64>(&lookup, "SM_LOGIN_WINDOW_SECS")? {
            limits.window = Duration::seconds(secs.max(1));
        }

        let default_account = match (
            lookup("SM_DEFAULT_ADMIN_LOGIN"),
            lookup("SM_DEFAULT_ADMIN_PASSWORD"),
        ) {
            (Some(login), Some(password)) => Some(DefaultAccount {
                login,
                password,
                name: lookup("SM_DEFAULT_ADMIN_NAME")
                    .unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        let reset = lookup("SM_RESET_DEFAULT_ADMIN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            socket_path: paths::socket_path(&state_dir),
            lock_path: state_dir.join(paths::PID_FILE),
            version_path: state_dir.join(paths::VERSION_FILE),
            log_path: state_dir.join(paths::LOG_FILE),
            store_path: state_dir.join(paths::STORE_FILE),
            store: StoreConfig {
                key: lookup("SM_STORE_KEY").filter(|k| !k.is_empty()),
                bcrypt_cost,
            },
            default_account,
            bootstrap: if reset {
                BootstrapPolicy::ResetExisting
            } else {
                BootstrapPolicy::CreateIfEmpty
            },
            limits,
            state_dir,
        })
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// The archive service
    pub archive: Archive,
    /// When daemon started
    pub start_time: Instant,
    /// Shutdown requested flag
    pub shutdown_requested: bool,
}

impl DaemonState {
    /// Shutdown the daemon gracefully
    pub fn shutdown(&mut self) {
        info!("Shutting down daemon...");

        let revoked = self.archive.revoke_all();
        info!(revoked, "sessions revoked");

        for (what, path) in [
            ("socket", &self.config.socket_path),
            ("PID", &self.config.lock_path),
            ("version", &self.config.version_path),
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {} file: {}", what, e);
                }
            }
        }

        // Lock file is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Invalid value for {var}: {value}")]
    InvalidConfig { var: &'static str, value: String },

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No credentials in store; set SM_DEFAULT_ADMIN_LOGIN and SM_DEFAULT_ADMIN_PASSWORD")]
    NoCredentials,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config) {
        Ok(state) => Ok(state),
        // Another daemon owns these files
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create directories
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - prevents two daemons sharing a store
    // Not truncated on open: a running daemon's PID must survive a failed attempt.
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    {
        use std::io::Write;
        writeln!(lock_file, "{}", std::process::id())?;
    }

    // Write version file
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Open the store; migrations run here and any failure aborts startup
    let store = Store::open(&config.store_path, &config.store, SystemClock)?;

    // 4. Guarantee a credential exists
    bootstrap_account(&store, config)?;

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let archive = Archive::new(
        store,
        SessionManager::new(UuidTokenGen, SystemClock),
        LoginThrottle::new(config.limits.clone(), SystemClock),
    );

    info!("Daemon started for state dir: {}", config.state_dir.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        archive,
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

fn bootstrap_account(store: &Store, config: &Config) -> Result<(), LifecycleError> {
    match &config.default_account {
        Some(account) => match store.ensure_default_account(account, config.bootstrap)? {
            BootstrapOutcome::Skipped => warn!("default account configured but blank; skipped"),
            outcome => info!(?outcome, "default account bootstrap"),
        },
        None => info!("no default account configured"),
    }

    if store.credential_count()? == 0 {
        return Err(LifecycleError::NoCredentials);
    }
    Ok(())
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [&config.socket_path, &config.version_path, &config.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

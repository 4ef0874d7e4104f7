// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout shared by the daemon and its clients

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Startup marker prefix written to the log before anything else.
/// Clients use it to find where the current startup attempt begins.
/// Full format: "--- smd: starting (pid: 12345)"
pub const STARTUP_MARKER_PREFIX: &str = "--- smd: starting (pid: ";

pub const STORE_FILE: &str = "store.db";
pub const LOG_FILE: &str = "daemon.log";
pub const PID_FILE: &str = "daemon.pid";
pub const VERSION_FILE: &str = "daemon.version";
pub const TOKEN_FILE: &str = "cli.token";

/// State directory: `SM_STATE_DIR`, else `$XDG_STATE_HOME/shelfmark`,
/// else `~/.local/state/shelfmark`
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SM_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("shelfmark"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/shelfmark"))
}

/// Socket directory
///
/// Uses /tmp/shelfmark by default to keep paths short (macOS SUN_LEN = 104).
/// Can be overridden with SM_SOCKET_DIR for testing.
pub fn socket_dir() -> PathBuf {
    std::env::var("SM_SOCKET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp/shelfmark"))
}

/// Socket path for a state directory. Distinct state directories never
/// share a socket.
pub fn socket_path(state_dir: &Path) -> PathBuf {
    socket_dir().join(format!("{}.sock", state_hash(state_dir)))
}

/// First 16 hex chars of the SHA-256 of the state directory path
pub fn state_hash(state_dir: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(state_dir.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

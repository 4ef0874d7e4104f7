// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session token cache at `<state_dir>/cli.token`

use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

fn token_path(state_dir: &Path) -> PathBuf {
    state_dir.join(sm_daemon::paths::TOKEN_FILE)
}

/// The cached token, if one was saved and is not blank
pub fn load(state_dir: &Path) -> Option<String> {
    std::fs::read_to_string(token_path(state_dir))
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Save a token readable only by the current user
pub fn save(state_dir: &Path, token: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(state_dir)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(token_path(state_dir))?;
    writeln!(file, "{}", token)
}

/// Forget the cached token. Returns whether one existed.
pub fn clear(state_dir: &Path) -> bool {
    std::fs::remove_file(token_path(state_dir)).is_ok()
}

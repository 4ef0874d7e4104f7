// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod auth;
pub mod daemon;
pub mod movements;
pub mod storage;

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::client::{ClientError, DaemonClient};
use crate::output::OutputFormat;
use crate::token;

/// What every command needs: where the state lives and how to print
pub struct Context {
    pub state_dir: PathBuf,
    pub format: OutputFormat,
}

impl Context {
    /// Connect (starting the daemon if needed) with the cached session token
    pub async fn authenticated(&self) -> Result<(DaemonClient, String)> {
        let Some(token) = token::load(&self.state_dir) else {
            bail!("not logged in; run `sm login <LOGIN>` first");
        };
        let client = DaemonClient::connect_or_start(&self.state_dir).await?;
        Ok((client, token))
    }

    /// Drop a token the daemon no longer accepts, and say how to recover
    pub fn session_error(&self, err: ClientError) -> anyhow::Error {
        if err.is_auth() {
            token::clear(&self.state_dir);
            anyhow::anyhow!("{}; run `sm login <LOGIN>` again", err)
        } else {
            err.into()
        }
    }
}

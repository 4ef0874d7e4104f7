// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! login, logout, whoami

use std::io::BufRead;

use anyhow::{Context as _, Result};

use super::Context;
use crate::client::DaemonClient;
use crate::output::{self, SessionView};
use crate::token;

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Login identifier
    login: String,

    /// Password; read from the first line of stdin when omitted
    #[arg(long)]
    password: Option<String>,
}

fn read_password() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn login(ctx: &Context, args: LoginArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => read_password()?,
    };

    let client = DaemonClient::connect_or_start(&ctx.state_dir).await?;
    let session = client.login(&args.login, &password).await?;
    token::save(&ctx.state_dir, &session.token).context("failed to cache session token")?;

    output::print(&SessionView::from(&session), ctx.format);
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let Some(cached) = token::load(&ctx.state_dir) else {
        println!("Not logged in");
        return Ok(());
    };

    // A stopped daemon already forgot every session
    if let Ok(client) = DaemonClient::connect(&ctx.state_dir) {
        client.logout(&cached).await?;
    }
    token::clear(&ctx.state_dir);
    println!("Logged out");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let (client, token) = ctx.authenticated().await?;
    let session = client
        .session(&token)
        .await
        .map_err(|e| ctx.session_error(e))?;
    output::print(&SessionView::from(&session), ctx.format);
    Ok(())
}

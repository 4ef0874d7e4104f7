// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sm - Shelfmark archive CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;
mod token;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{auth, daemon, movements, storage, Context};

use crate::client::resolve_state_dir;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "sm",
    version,
    about = "Shelfmark - storage units and their movement log"
)]
struct Cli {
    /// State directory (defaults to $SM_STATE_DIR, then $XDG_STATE_HOME/shelfmark)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and cache the session token
    Login(auth::LoginArgs),
    /// End the cached session
    Logout,
    /// Show the logged-in account and a summary of the archive
    Whoami,
    /// Storage unit management
    Storage(storage::StorageArgs),
    /// Movement log
    Movements(movements::MovementsArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = Context {
        state_dir: resolve_state_dir(cli.state_dir)?,
        format: cli.output,
    };

    match cli.command {
        Commands::Login(args) => auth::login(&ctx, args).await,
        Commands::Logout => auth::logout(&ctx).await,
        Commands::Whoami => auth::whoami(&ctx).await,
        Commands::Storage(args) => storage::handle(&ctx, args.command).await,
        Commands::Movements(args) => movements::handle(&ctx, args.command).await,
        Commands::Daemon(args) => daemon::handle(&ctx, args.command).await,
    }
}

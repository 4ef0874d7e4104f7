// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management: start, stop, status

use anyhow::Result;
use clap::Subcommand;

use super::Context;
use crate::client::{daemon_stop, ClientError, DaemonClient};

#[derive(clap::Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop the daemon; every session ends
    Stop,
    /// Show daemon status
    Status,
}

pub async fn handle(ctx: &Context, command: DaemonCommand) -> Result<()> {
    match command {
        DaemonCommand::Start => {
            if DaemonClient::connect(&ctx.state_dir).is_ok() {
                println!("Daemon already running");
                return Ok(());
            }
            DaemonClient::connect_or_start(&ctx.state_dir).await?;
            println!("Daemon started");
        }
        DaemonCommand::Stop => {
            if daemon_stop(&ctx.state_dir).await? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }
        DaemonCommand::Status => {
            let client = match DaemonClient::connect(&ctx.state_dir) {
                Ok(client) => client,
                Err(ClientError::DaemonNotRunning) => {
                    println!("Daemon not running");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let version = client.hello().await?;
            let (uptime_secs, sessions_active) = client.status().await?;
            println!("Status: running");
            println!("Version: {}", version);
            println!("Uptime: {}", format_uptime(uptime_secs));
            println!("Sessions: {}", sessions_active);
            println!("State dir: {}", ctx.state_dir.display());
        }
    }
    Ok(())
}

fn format_uptime(secs: u64) -> String {
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    }
}

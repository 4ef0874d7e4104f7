// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! movements list / record

use anyhow::Result;
use clap::Subcommand;
use sm_daemon::MovementPayload;

use super::Context;
use crate::output::{self, MovementList, MovementRecorded};

#[derive(clap::Args)]
pub struct MovementsArgs {
    #[command(subcommand)]
    pub command: MovementsCommand,
}

#[derive(Subcommand)]
pub enum MovementsCommand {
    /// List the most recent movements, newest first
    List {
        /// Number of movements (default 25, at most 500)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Record a movement; the actor is the logged-in account
    Record {
        /// What happened
        action: String,
        /// External reference (request number, case file)
        #[arg(long)]
        reference: Option<String>,
        /// Item moved; moving an item adjusts unit occupancy
        #[arg(long)]
        item: Option<String>,
        /// Label of the unit the item left
        #[arg(long)]
        from: Option<String>,
        /// Label of the unit the item entered
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
}

pub async fn handle(ctx: &Context, command: MovementsCommand) -> Result<()> {
    let (client, token) = ctx.authenticated().await?;
    match command {
        MovementsCommand::List { limit } => {
            let movements = client
                .list_movements(&token, limit)
                .await
                .map_err(|e| ctx.session_error(e))?;
            output::print(&MovementList(&movements), ctx.format);
        }
        MovementsCommand::Record {
            action,
            reference,
            item,
            from,
            to,
            note,
        } => {
            let payload = MovementPayload {
                action: Some(action),
                reference,
                item_label: item,
                from_unit: from,
                to_unit: to,
                note,
            };
            let (movement, snapshot) = client
                .record_movement(&token, payload)
                .await
                .map_err(|e| ctx.session_error(e))?;
            output::print(
                &MovementRecorded {
                    movement: &movement,
                    snapshot: &snapshot,
                },
                ctx.format,
            );
        }
    }
    Ok(())
}

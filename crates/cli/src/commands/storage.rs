// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! storage list / create

use anyhow::{Context as _, Result};
use clap::Subcommand;
use sm_daemon::UnitPayload;

use super::Context;
use crate::output::{self, UnitCreated, UnitList};

#[derive(clap::Args)]
pub struct StorageArgs {
    #[command(subcommand)]
    pub command: StorageCommand,
}

#[derive(Subcommand)]
pub enum StorageCommand {
    /// List storage units, most recently updated first
    List,
    /// Register a new storage unit
    Create {
        /// Unit label
        label: String,
        /// FOLDER, ENVELOPE, CABINET or BOX
        #[arg(long = "type", value_name = "TYPE")]
        kind: String,
        /// Section or location
        #[arg(long)]
        section: Option<String>,
        /// Maximum number of items
        #[arg(long)]
        capacity: Option<u64>,
        /// Arbitrary JSON metadata
        #[arg(long)]
        metadata: Option<String>,
    },
}

pub async fn handle(ctx: &Context, command: StorageCommand) -> Result<()> {
    match command {
        StorageCommand::List => {
            let (client, token) = ctx.authenticated().await?;
            let units = client
                .list_units(&token)
                .await
                .map_err(|e| ctx.session_error(e))?;
            output::print(&UnitList(&units), ctx.format);
        }
        StorageCommand::Create {
            label,
            kind,
            section,
            capacity,
            metadata,
        } => {
            let metadata = metadata
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()
                .context("--metadata must be valid JSON")?;
            let payload = UnitPayload {
                label: Some(label),
                kind: Some(kind),
                section,
                capacity: capacity.map(serde_json::Value::from),
                metadata,
            };

            let (client, token) = ctx.authenticated().await?;
            let (unit, snapshot) = client
                .create_unit(&token, payload)
                .await
                .map_err(|e| ctx.session_error(e))?;
            output::print(
                &UnitCreated {
                    unit: &unit,
                    snapshot: &snapshot,
                },
                ctx.format,
            );
        }
    }
    Ok(())
}

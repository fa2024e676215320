// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::group_matcher::GroupMatcherArgs;
use crate::output::{print_json, print_table, OutputFormat};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use schedstore_core::{GroupMatcher, TriggerKey};
use schedstore_daemon::Coordinator;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct TriggersArgs {
    #[command(subcommand)]
    command: TriggersCommand,
}

#[derive(Subcommand)]
enum TriggersCommand {
    /// List trigger keys and their current state, optionally filtered by group
    List {
        #[command(flatten)]
        matcher: GroupMatcherArgs,
    },
    /// Show one trigger's full stored document
    Show {
        /// Trigger group
        group: String,
        /// Trigger name
        name: String,
    },
}

pub async fn run(coordinator: &Coordinator, args: TriggersArgs, format: OutputFormat, cancel: &CancellationToken) -> Result<()> {
    let instance_name = coordinator.config().instance_name.as_str();
    match args.command {
        TriggersCommand::List { matcher } => {
            let matcher: GroupMatcher = (&matcher).into();
            let keys = coordinator.storage().list_trigger_keys(instance_name, &matcher, cancel).await.context("listing trigger keys")?;
            let mut rows = Vec::with_capacity(keys.len());
            for key in keys {
                let state = coordinator.storage().get_trigger(&key, cancel).await?.map(|t| t.state.to_string()).unwrap_or_else(|| "?".to_string());
                rows.push(vec![key.group, key.name, state]);
            }
            print_table(format, &["group", "name", "state"], &rows);
        }
        TriggersCommand::Show { group, name } => {
            let key = TriggerKey::new(instance_name, group, name);
            match coordinator.storage().get_trigger(&key, cancel).await.context("fetching trigger")? {
                Some(trigger) => print_json(&trigger),
                None => eprintln!("no such trigger"),
            }
        }
    }
    Ok(())
}

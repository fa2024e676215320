// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::group_matcher::GroupMatcherArgs;
use crate::output::{print_table, OutputFormat};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use schedstore_core::GroupMatcher;
use schedstore_daemon::Coordinator;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    command: GroupsCommand,
}

#[derive(Subcommand)]
enum GroupsCommand {
    /// List every trigger group currently paused
    List,
    /// Pause a group of triggers
    Pause {
        #[command(flatten)]
        matcher: GroupMatcherArgs,
    },
    /// Resume a paused group of triggers
    Resume {
        #[command(flatten)]
        matcher: GroupMatcherArgs,
    },
}

pub async fn run(coordinator: &Coordinator, args: GroupsArgs, format: OutputFormat, cancel: &CancellationToken) -> Result<()> {
    let instance_name = coordinator.config().instance_name.as_str();
    match args.command {
        GroupsCommand::List => {
            let groups = coordinator.repos().paused.list(instance_name, cancel).await.context("listing paused groups")?;
            let rows: Vec<Vec<String>> = groups.into_iter().map(|g| vec![g]).collect();
            print_table(format, &["group"], &rows);
        }
        GroupsCommand::Pause { matcher } => {
            let matcher: GroupMatcher = (&matcher).into();
            coordinator.storage().pause_trigger_group(instance_name, &matcher, cancel).await.context("pausing trigger group")?;
            println!("paused");
        }
        GroupsCommand::Resume { matcher } => {
            let matcher: GroupMatcher = (&matcher).into();
            coordinator.storage().resume_trigger_group(instance_name, &matcher, cancel).await.context("resuming trigger group")?;
            println!("resumed");
        }
    }
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::group_matcher::GroupMatcherArgs;
use crate::output::{print_json, print_table, OutputFormat};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use schedstore_core::{GroupMatcher, JobKey};
use schedstore_daemon::Coordinator;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct JobsArgs {
    #[command(subcommand)]
    command: JobsCommand,
}

#[derive(Subcommand)]
enum JobsCommand {
    /// List job keys, optionally filtered by group
    List {
        #[command(flatten)]
        matcher: GroupMatcherArgs,
    },
    /// Show one job's full stored document
    Show {
        /// Trigger group
        group: String,
        /// Job name
        name: String,
    },
}

pub async fn run(coordinator: &Coordinator, args: JobsArgs, format: OutputFormat, cancel: &CancellationToken) -> Result<()> {
    let instance_name = coordinator.config().instance_name.as_str();
    match args.command {
        JobsCommand::List { matcher } => {
            let matcher: GroupMatcher = (&matcher).into();
            let keys = coordinator.storage().list_job_keys(instance_name, &matcher, cancel).await.context("listing job keys")?;
            let rows: Vec<Vec<String>> = keys.into_iter().map(|k| vec![k.group, k.name]).collect();
            print_table(format, &["group", "name"], &rows);
        }
        JobsCommand::Show { group, name } => {
            let key = JobKey::new(instance_name, group, name);
            match coordinator.storage().get_job(&key, cancel).await.context("fetching job")? {
                Some(job) => print_json(&job),
                None => eprintln!("no such job"),
            }
        }
    }
    Ok(())
}

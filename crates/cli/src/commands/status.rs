// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::output::{print_table, OutputFormat};
use anyhow::{Context as _, Result};
use clap::Args;
use schedstore_core::LockType;
use schedstore_daemon::Coordinator;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct StatusArgs {}

pub async fn run(coordinator: &Coordinator, _args: StatusArgs, format: OutputFormat, cancel: &CancellationToken) -> Result<()> {
    let instance_name = coordinator.config().instance_name.as_str();
    let registrations = coordinator.repos().schedulers.list(instance_name, cancel).await.context("listing scheduler registrations")?;
    let rows: Vec<Vec<String>> = registrations
        .into_iter()
        .map(|r| vec![r.instance_id.as_str().to_string(), r.state.to_string(), r.version, r.last_check_in.to_rfc3339()])
        .collect();
    print_table(format, &["instance_id", "state", "version", "last_check_in"], &rows);

    let trigger_access_held = coordinator.mutex().is_held(LockType::TriggerAccess, cancel).await.context("checking TriggerAccess lock")?;
    let state_access_held = coordinator.mutex().is_held(LockType::StateAccess, cancel).await.context("checking StateAccess lock")?;
    println!("TriggerAccess lock held: {trigger_access_held}");
    println!("StateAccess lock held: {state_access_held}");
    Ok(())
}

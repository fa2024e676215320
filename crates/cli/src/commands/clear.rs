// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::{bail, Context as _, Result};
use clap::Args;
use schedstore_daemon::Coordinator;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct ClearArgs {
    /// Required: confirms the irreversible wipe of every job, trigger,
    /// calendar, and bookkeeping row for this instance
    #[arg(long)]
    yes: bool,
}

pub async fn run(coordinator: &Coordinator, args: ClearArgs, cancel: &CancellationToken) -> Result<()> {
    if !args.yes {
        bail!("refusing to clear scheduling data without --yes");
    }
    coordinator.clear_all_scheduling_data(cancel).await.context("clearing scheduling data")?;
    println!("cleared all scheduling data for instance '{}'", coordinator.config().instance_name.as_str());
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `schedstore` - operational admin CLI over a running `schedstore` cluster
//! (spec §6 "Supplemented CLI surface"). Thin formatting wrapper over
//! `schedstore-engine`/`schedstore-daemon` — no business logic lives here.

mod commands;
mod group_matcher;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;
use schedstore_daemon::{Config, Coordinator};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "schedstore", version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")), about = "Operational admin CLI for a schedstore cluster")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Job inspection
    Jobs(commands::jobs::JobsArgs),
    /// Trigger inspection
    Triggers(commands::triggers::TriggersArgs),
    /// Trigger group pause/resume
    Groups(commands::groups::GroupsArgs),
    /// Wipe every job, trigger, calendar, and bookkeeping row for this instance
    Clear(commands::clear::ClearArgs),
    /// Scheduler registrations and lock status for the cluster
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let coordinator = Coordinator::connect(config).await?;
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Jobs(args) => commands::jobs::run(&coordinator, args, cli.output, &cancel).await,
        Commands::Triggers(args) => commands::triggers::run(&coordinator, args, cli.output, &cancel).await,
        Commands::Groups(args) => commands::groups::run(&coordinator, args, cli.output, &cancel).await,
        Commands::Clear(args) => commands::clear::run(&coordinator, args, &cancel).await,
        Commands::Status(args) => commands::status::run(&coordinator, args, cli.output, &cancel).await,
    }
}

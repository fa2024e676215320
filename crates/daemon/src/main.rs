// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `schedstored`: the clustered job-store coordinator process. Validates
//! configuration, connects to the document store, runs startup crash
//! recovery, then runs the background misfire sweeper until told to stop.

use schedstore_daemon::{Config, Coordinator};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = Config::load().map_err(|e| {
        error!(%e, "invalid configuration");
        e
    })?;

    let cancel = CancellationToken::new();
    let mut coordinator = Coordinator::connect(config).await.map_err(|e| {
        error!(%e, "failed to connect to the document store");
        e
    })?;

    coordinator.scheduler_started(&cancel).await?;
    info!("schedstored ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    cancel.cancel();
    coordinator.shutdown(&CancellationToken::new()).await?;
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

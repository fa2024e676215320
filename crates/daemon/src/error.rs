// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle coordinator error taxonomy (spec §4.8): adds configuration
//! validation on top of whatever `schedstore-engine` surfaces.

use schedstore_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("database connection failed: {0}")]
    Connect(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

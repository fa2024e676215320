// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! schedstore-engine: the policy layer over `schedstore-storage`'s
//! repositories — the storage managers (spec §4.5) and the fire manager
//! (spec §4.6), both driving `schedstore_core::state_machine::transition`
//! under `schedstore-adapters::DistributedMutex`'s `TriggerAccess` lock.
//!
//! `schedstore-daemon` builds the lifecycle coordinator (spec §4.7) on top
//! of these two managers.

mod error;
mod fire_manager;
mod listener;
mod locking;
mod repos;
mod storage_manager;

pub use error::EngineError;
pub use fire_manager::{FireBundle, FireManager, MisfireSweepResult};
pub use listener::{FireListener, NoopFireListener};
pub use repos::Repos;
pub use storage_manager::StorageManager;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fired-trigger records (spec §3) — created when a trigger is handed to a
//! worker, deleted when completion is reported, consulted by crash recovery
//! of the owning instance.

use crate::ids::{FiredInstanceId, InstanceId, JobKey, TriggerKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredTrigger {
    pub id: FiredInstanceId,
    pub instance_id: InstanceId,
    pub trigger_key: TriggerKey,
    pub job_key: JobKey,
    pub fired_time: DateTime<Utc>,
    pub scheduled_fire_time: DateTime<Utc>,
    pub requests_recovery: bool,
    pub concurrent_execution_disallowed: bool,
    /// Spec §3 supplement — lets a recovery pass re-derive acquisition
    /// order without reloading the (possibly already-mutated) trigger.
    pub priority: i32,
}

#[cfg(test)]
#[path = "fired_trigger_tests.rs"]
mod tests;

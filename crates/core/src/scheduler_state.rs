// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler instance registrations (spec §3) — created at instance
//! startup, deleted at clean shutdown.

use crate::ids::{InstanceId, InstanceName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerRegistrationState {
    Started,
    Running,
    Paused,
    Resumed,
}

crate::simple_display! {
    SchedulerRegistrationState {
        Started => "started",
        Running => "running",
        Paused => "paused",
        Resumed => "resumed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerRegistration {
    pub instance_name: InstanceName,
    pub instance_id: InstanceId,
    pub state: SchedulerRegistrationState,
    pub last_check_in: DateTime<Utc>,
    /// Store crate semver, surfaced for "why is this node on an old build"
    /// diagnostics (spec §3 supplement).
    pub version: String,
    #[serde(with = "crate::duration_serde")]
    pub cluster_check_in_interval: chrono::Duration,
}

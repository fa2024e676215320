// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two named, cluster-wide mutexes (spec §4.2).

use crate::ids::{InstanceId, InstanceName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only two lock names that exist in this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    /// Covers all mutations of triggers, jobs, calendars, paused-groups,
    /// and fired-trigger records.
    TriggerAccess,
    /// Reserved for scheduler-state updates.
    StateAccess,
}

crate::simple_display! {
    LockType {
        TriggerAccess => "trigger_access",
        StateAccess => "state_access",
    }
}

/// A lock document: `(instance_name, lock_type)` primary key, owned by
/// whichever instance currently holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDocument {
    pub instance_name: InstanceName,
    pub lock_type: LockType,
    pub owner: InstanceId,
    pub acquired_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

impl LockDocument {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at < now
    }
}

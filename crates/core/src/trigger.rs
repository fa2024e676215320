// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger definitions (spec §3).

use crate::ids::{JobKey, TriggerKey};
use crate::recurrence::RecurrenceRule;
use crate::state_machine::TriggerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel `misfire_instruction` meaning "ignore misfire policy entirely"
/// (spec §3).
pub const IGNORE_MISFIRE_POLICY: i32 = -1;

/// Signed misfire instruction. `-1` is the sentinel spec §3 calls out by
/// name; `0` and positive values are recurrence-kind-specific (spec §3
/// supplement) and are round-tripped opaquely rather than interpreted here
/// — only the sentinel changes acquisition/misfire-sweep behavior (spec
/// §4.3, §4.6.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MisfireInstruction(pub i32);

impl MisfireInstruction {
    pub const IGNORE: MisfireInstruction = MisfireInstruction(IGNORE_MISFIRE_POLICY);
    pub const SMART_POLICY: MisfireInstruction = MisfireInstruction(0);

    pub fn is_ignore(&self) -> bool {
        self.0 == IGNORE_MISFIRE_POLICY
    }
}

impl Default for MisfireInstruction {
    fn default() -> Self {
        Self::SMART_POLICY
    }
}

impl From<i32> for MisfireInstruction {
    fn from(v: i32) -> Self {
        MisfireInstruction(v)
    }
}

impl From<MisfireInstruction> for i32 {
    fn from(v: MisfireInstruction) -> Self {
        v.0
    }
}

/// A rule (recurrence + calendar + misfire policy) that schedules fires of
/// a specific job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub key: TriggerKey,
    pub job_key: JobKey,
    pub description: Option<String>,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    /// Higher fires first on ties; default 5 (spec §3).
    pub priority: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub calendar_name: Option<String>,
    pub misfire_instruction: MisfireInstruction,
    pub data: HashMap<String, String>,
    pub state: TriggerState,
    pub recurrence: RecurrenceRule,
}

/// Default trigger priority (spec §3).
pub const DEFAULT_PRIORITY: i32 = 5;

crate::builder! {
    pub struct TriggerBuilder => Trigger {
        set { key: TriggerKey = TriggerKey::new("test-instance", "default", format!("trigger-{}", uuid::Uuid::new_v4())) }
        set { job_key: JobKey = JobKey::new("test-instance", "default", "job-1") }
        into { description: Option<String> = None }
        option { next_fire_time: DateTime<Utc> = None }
        option { previous_fire_time: DateTime<Utc> = None }
        set { priority: i32 = DEFAULT_PRIORITY }
        set { start_time: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH }
        option { end_time: DateTime<Utc> = None }
        option { calendar_name: String = None }
        set { misfire_instruction: MisfireInstruction = MisfireInstruction::SMART_POLICY }
        set { data: HashMap<String, String> = HashMap::new() }
        set { state: TriggerState = TriggerState::Waiting }
        set { recurrence: RecurrenceRule = RecurrenceRule::Simple(crate::recurrence::SimpleTrigger {
            start_time: DateTime::<Utc>::UNIX_EPOCH,
            end_time: None,
            repeat_interval: chrono::Duration::minutes(1),
            repeat_count: None,
            times_triggered: 0,
        }) }
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::ids::{InstanceName, JobKey, TriggerKey};
use crate::recurrence::{RecurrenceRule, SimpleTrigger};
use crate::state_machine::TriggerState;
use crate::trigger::MisfireInstruction;
use chrono::{DateTime, Utc};

/// Proptest strategies for core state machine types.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_trigger_state() -> impl Strategy<Value = TriggerState> {
        prop_oneof![
            Just(TriggerState::Waiting),
            Just(TriggerState::Acquired),
            Just(TriggerState::Executing),
            Just(TriggerState::Paused),
            Just(TriggerState::PausedBlocked),
            Just(TriggerState::Complete),
            Just(TriggerState::Error),
            Just(TriggerState::Deleted),
        ]
    }

    pub fn arb_misfire_instruction() -> impl Strategy<Value = MisfireInstruction> {
        (-1i32..=3i32).prop_map(MisfireInstruction)
    }

    /// Arbitrary ASCII identifier segment, suitable for group/name fields.
    pub fn arb_key_segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,15}".prop_map(|s| s.to_string())
    }
}

/// A distinct job key under a fixed test instance/group, so parallel test
/// cases never collide on a natural key (spec §3 composite keys have no
/// generated component to fall back on).
pub fn fresh_job_key(group: &str) -> JobKey {
    JobKey::new("test-instance", group, format!("job-{}", uuid::Uuid::new_v4()))
}

pub fn fresh_trigger_key(group: &str) -> TriggerKey {
    TriggerKey::new("test-instance", group, format!("trigger-{}", uuid::Uuid::new_v4()))
}

pub fn test_instance() -> InstanceName {
    InstanceName::from("test-instance")
}

/// A `Simple` recurrence firing once at `fire_time`, never again.
pub fn one_shot_recurrence(fire_time: DateTime<Utc>) -> RecurrenceRule {
    RecurrenceRule::Simple(SimpleTrigger {
        start_time: fire_time,
        end_time: None,
        repeat_interval: chrono::Duration::zero(),
        repeat_count: Some(0),
        times_triggered: 0,
    })
}

/// A `Simple` recurrence firing every `interval` indefinitely, starting now.
pub fn repeating_recurrence(start: DateTime<Utc>, interval: chrono::Duration) -> RecurrenceRule {
    RecurrenceRule::Simple(SimpleTrigger {
        start_time: start,
        end_time: None,
        repeat_interval: interval,
        repeat_count: None,
        times_triggered: 0,
    })
}

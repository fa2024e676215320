// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_priority_matches_spec() {
    let t = Trigger::builder().build();
    assert_eq!(t.priority, DEFAULT_PRIORITY);
}

#[test]
fn misfire_instruction_sentinel_is_minus_one() {
    assert_eq!(IGNORE_MISFIRE_POLICY, -1);
    assert!(MisfireInstruction::IGNORE.is_ignore());
    assert!(!MisfireInstruction::SMART_POLICY.is_ignore());
}

#[test]
fn misfire_instruction_round_trips_through_i32() {
    let mi: MisfireInstruction = 7.into();
    let back: i32 = mi.into();
    assert_eq!(back, 7);
}

#[test]
fn builder_sets_custom_keys() {
    let job_key = JobKey::new("cluster-a", "billing", "invoice");
    let trigger_key = TriggerKey::new("cluster-a", "billing", "invoice-trigger");
    let t = Trigger::builder()
        .key(trigger_key.clone())
        .job_key(job_key.clone())
        .build();
    assert_eq!(t.key, trigger_key);
    assert_eq!(t.job_key, job_key);
}

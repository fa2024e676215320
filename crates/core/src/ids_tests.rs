// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_key_display_matches_group_dot_name() {
    let key = JobKey::new("cluster-a", "g", "j");
    assert_eq!(key.to_string(), "g.j");
}

#[test]
fn fired_instance_id_owner_prefix_excludes_ticks() {
    let trigger = TriggerKey::new("cluster-a", "g", "t");
    let id = FiredInstanceId::new(&trigger, InstanceId::from("node-1"), 12345);
    assert_eq!(id.owner_prefix(), "t:g:node-1");
    assert_eq!(id.as_string(), "t:g:node-1:12345");
}

#[test]
fn instance_name_borrows_as_str_for_map_lookup() {
    use std::collections::HashMap;
    let mut m: HashMap<InstanceName, u32> = HashMap::new();
    m.insert(InstanceName::from("cluster-a"), 1);
    assert_eq!(m.get("cluster-a"), Some(&1));
}

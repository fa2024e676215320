// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Index descriptors ensured on first use (spec §4.1).

use crate::backend::IndexSpec;
use crate::collections::CollectionNames;
use bson::doc;

/// `(collection_name, indexes)` pairs to ensure at store initialization.
pub fn all(names: &CollectionNames) -> Vec<(String, Vec<IndexSpec>)> {
    vec![
        (
            names.triggers(),
            vec![
                IndexSpec::new("acquisition", doc! { "instance_name": 1, "state": 1, "next_fire_time": 1, "priority": -1 }),
                IndexSpec::new("by_job", doc! { "instance_name": 1, "job_key": 1 }),
                IndexSpec::new("by_calendar", doc! { "instance_name": 1, "calendar_name": 1 }),
                IndexSpec::new("pk", doc! { "instance_name": 1, "group": 1, "name": 1 }).unique(),
            ],
        ),
        (
            names.jobs(),
            vec![IndexSpec::new("pk", doc! { "instance_name": 1, "group": 1, "name": 1 }).unique()],
        ),
        (
            names.calendars(),
            vec![IndexSpec::new("pk", doc! { "instance_name": 1, "name": 1 }).unique()],
        ),
        (
            names.locks(),
            vec![
                IndexSpec::new("pk", doc! { "instance_name": 1, "lock_type": 1 }).unique(),
                IndexSpec::new("ttl", doc! { "expire_at": 1 }).ttl(0),
            ],
        ),
        (
            names.fired_triggers(),
            vec![
                IndexSpec::new("pk", doc! { "instance_name": 1, "fired_instance_id": 1 }).unique(),
                IndexSpec::new("by_instance", doc! { "instance_name": 1, "instance_id": 1 }),
            ],
        ),
        (
            names.paused_trigger_groups(),
            vec![IndexSpec::new("pk", doc! { "instance_name": 1, "group": 1 }).unique()],
        ),
        (
            names.schedulers(),
            vec![IndexSpec::new("pk", doc! { "instance_name": 1, "instance_id": 1 }).unique()],
        ),
    ]
}

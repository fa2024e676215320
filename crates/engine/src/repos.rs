// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The six entity repositories bundled behind a single handle, so the
//! storage and fire managers construct one object instead of threading six.

use schedstore_storage::{CalendarRepository, FiredTriggerRepository, JobRepository, PausedGroupRepository, SchedulerRepository, StorageContext, TriggerRepository};
use std::sync::Arc;

pub struct Repos {
    pub jobs: JobRepository,
    pub triggers: TriggerRepository,
    pub calendars: CalendarRepository,
    pub fired: FiredTriggerRepository,
    pub paused: PausedGroupRepository,
    pub schedulers: SchedulerRepository,
}

impl Repos {
    pub fn new(ctx: Arc<StorageContext>) -> Self {
        Self {
            jobs: JobRepository::new(ctx.clone()),
            triggers: TriggerRepository::new(ctx.clone()),
            calendars: CalendarRepository::new(ctx.clone()),
            fired: FiredTriggerRepository::new(ctx.clone()),
            paused: PausedGroupRepository::new(ctx.clone()),
            schedulers: SchedulerRepository::new(ctx),
        }
    }
}

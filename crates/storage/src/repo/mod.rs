// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity repositories (spec §4.3) — thin, typed façades over
//! [`crate::backend::StoreBackend`].

pub mod calendars;
pub mod fired;
pub mod jobs;
pub mod paused_groups;
pub mod schedulers;
pub mod triggers;

pub use calendars::CalendarRepository;
pub use fired::FiredTriggerRepository;
pub use jobs::JobRepository;
pub use paused_groups::PausedGroupRepository;
pub use schedulers::SchedulerRepository;
pub use triggers::TriggerRepository;

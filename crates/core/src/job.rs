// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job definitions (spec §3).

use crate::ids::JobKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named, persistent unit of work referenced by triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub key: JobKey,
    pub description: Option<String>,
    /// Opaque symbol the external worker pool resolves to an executable.
    pub job_type: String,
    /// If false, the job is deleted once it has no remaining triggers.
    pub durable: bool,
    /// If true, the per-trigger data map is written back on completion.
    pub persist_data_after_execution: bool,
    /// If true, only one trigger for this job may be in the firing window
    /// at a time.
    pub concurrent_execution_disallowed: bool,
    /// If true, an interrupted firing is rescheduled at startup.
    pub requests_recovery: bool,
    pub data: HashMap<String, String>,
}

impl Job {
    /// Merge this job's data map with a trigger's, trigger keys winning on
    /// conflict (spec §3 supplement — the effective map handed to the
    /// worker pool at fire time).
    pub fn merged_data(&self, trigger_data: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = self.data.clone();
        merged.extend(trigger_data.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        set { key: JobKey = JobKey::new("test-instance", "default", format!("job-{}", uuid::Uuid::new_v4())) }
        into { description: Option<String> = None }
        into { job_type: String = "noop" }
        set { durable: bool = false }
        set { persist_data_after_execution: bool = false }
        set { concurrent_execution_disallowed: bool = false }
        set { requests_recovery: bool = false }
        set { data: HashMap<String, String> = HashMap::new() }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-shape document structs and their conversions to/from the pure
//! domain types in `schedstore-core`.
//!
//! `schedstore-core` stays free of `bson` (spec's "pure data model");
//! top-level timestamp fields that the acquisition query and sweeper filter
//! on (`next_fire_time`, `expire_at`, `last_check_in`, ...) are stored as
//! native BSON dates via `bson::serde_helpers`. Fields embedded inside
//! `RecurrenceRule`/`Calendar` aren't queried directly (spec §3: "only the
//! state machine and acquisition care about next_fire_time/state/priority")
//! and round-trip through their own `chrono`-default string encoding.

use bson::serde_helpers::{chrono_datetime_as_bson_datetime, chrono_datetime_as_bson_datetime_optional};
use chrono::{DateTime, Utc};
use schedstore_core::{
    Calendar, FiredTrigger, Job, LockDocument, LockType, MisfireInstruction, RecurrenceRule,
    SchedulerRegistration, SchedulerRegistrationState, Trigger, TriggerState,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDocument {
    pub instance_name: String,
    pub group: String,
    pub name: String,
    pub description: Option<String>,
    pub job_type: String,
    pub durable: bool,
    pub persist_data_after_execution: bool,
    pub concurrent_execution_disallowed: bool,
    pub requests_recovery: bool,
    pub data: HashMap<String, String>,
}

impl From<&Job> for JobDocument {
    fn from(job: &Job) -> Self {
        Self {
            instance_name: job.key.instance_name.as_str().to_string(),
            group: job.key.group.clone(),
            name: job.key.name.clone(),
            description: job.description.clone(),
            job_type: job.job_type.clone(),
            durable: job.durable,
            persist_data_after_execution: job.persist_data_after_execution,
            concurrent_execution_disallowed: job.concurrent_execution_disallowed,
            requests_recovery: job.requests_recovery,
            data: job.data.clone(),
        }
    }
}

impl From<JobDocument> for Job {
    fn from(doc: JobDocument) -> Self {
        Job {
            key: schedstore_core::JobKey::new(doc.instance_name, doc.group, doc.name),
            description: doc.description,
            job_type: doc.job_type,
            durable: doc.durable,
            persist_data_after_execution: doc.persist_data_after_execution,
            concurrent_execution_disallowed: doc.concurrent_execution_disallowed,
            requests_recovery: doc.requests_recovery,
            data: doc.data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDocument {
    pub instance_name: String,
    pub group: String,
    pub name: String,
    pub job_instance_name: String,
    pub job_group: String,
    pub job_name: String,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "chrono_datetime_as_bson_datetime_optional")]
    pub next_fire_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "chrono_datetime_as_bson_datetime_optional")]
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub priority: i32,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "chrono_datetime_as_bson_datetime_optional")]
    pub end_time: Option<DateTime<Utc>>,
    pub calendar_name: Option<String>,
    pub misfire_instruction: i32,
    pub data: HashMap<String, String>,
    pub state: TriggerState,
    pub recurrence: RecurrenceRule,
}

impl From<&Trigger> for TriggerDocument {
    fn from(t: &Trigger) -> Self {
        Self {
            instance_name: t.key.instance_name.as_str().to_string(),
            group: t.key.group.clone(),
            name: t.key.name.clone(),
            job_instance_name: t.job_key.instance_name.as_str().to_string(),
            job_group: t.job_key.group.clone(),
            job_name: t.job_key.name.clone(),
            description: t.description.clone(),
            next_fire_time: t.next_fire_time,
            previous_fire_time: t.previous_fire_time,
            priority: t.priority,
            start_time: t.start_time,
            end_time: t.end_time,
            calendar_name: t.calendar_name.clone(),
            misfire_instruction: t.misfire_instruction.into(),
            data: t.data.clone(),
            state: t.state,
            recurrence: t.recurrence.clone(),
        }
    }
}

impl From<TriggerDocument> for Trigger {
    fn from(doc: TriggerDocument) -> Self {
        Trigger {
            key: schedstore_core::TriggerKey::new(doc.instance_name, doc.group, doc.name),
            job_key: schedstore_core::JobKey::new(doc.job_instance_name, doc.job_group, doc.job_name),
            description: doc.description,
            next_fire_time: doc.next_fire_time,
            previous_fire_time: doc.previous_fire_time,
            priority: doc.priority,
            start_time: doc.start_time,
            end_time: doc.end_time,
            calendar_name: doc.calendar_name,
            misfire_instruction: MisfireInstruction::from(doc.misfire_instruction),
            data: doc.data,
            state: doc.state,
            recurrence: doc.recurrence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDocument {
    pub instance_name: String,
    pub name: String,
    pub calendar: Calendar,
}

impl CalendarDocument {
    pub fn new(instance_name: impl Into<String>, name: impl Into<String>, calendar: Calendar) -> Self {
        Self { instance_name: instance_name.into(), name: name.into(), calendar }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredTriggerDocument {
    pub instance_name: String,
    pub fired_instance_id: String,
    pub trigger_name: String,
    pub trigger_group: String,
    pub instance_id: String,
    pub utc_ticks: i64,
    pub job_instance_name: String,
    pub job_group: String,
    pub job_name: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub fired_time: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub scheduled_fire_time: DateTime<Utc>,
    pub requests_recovery: bool,
    pub concurrent_execution_disallowed: bool,
    pub priority: i32,
}

impl FiredTriggerDocument {
    pub fn from_domain(instance_name: &str, f: &FiredTrigger) -> Self {
        Self {
            instance_name: instance_name.to_string(),
            fired_instance_id: f.id.as_string(),
            trigger_name: f.id.trigger_name.clone(),
            trigger_group: f.id.trigger_group.clone(),
            instance_id: f.id.instance_id.as_str().to_string(),
            utc_ticks: f.id.utc_ticks,
            job_instance_name: f.job_key.instance_name.as_str().to_string(),
            job_group: f.job_key.group.clone(),
            job_name: f.job_key.name.clone(),
            fired_time: f.fired_time,
            scheduled_fire_time: f.scheduled_fire_time,
            requests_recovery: f.requests_recovery,
            concurrent_execution_disallowed: f.concurrent_execution_disallowed,
            priority: f.priority,
        }
    }
}

impl From<FiredTriggerDocument> for FiredTrigger {
    fn from(doc: FiredTriggerDocument) -> Self {
        let trigger_key = schedstore_core::TriggerKey::new(doc.instance_name, doc.trigger_group, doc.trigger_name);
        let instance_id = schedstore_core::InstanceId::from(doc.instance_id);
        FiredTrigger {
            id: schedstore_core::FiredInstanceId::new(&trigger_key, instance_id.clone(), doc.utc_ticks),
            instance_id,
            trigger_key,
            job_key: schedstore_core::JobKey::new(doc.job_instance_name, doc.job_group, doc.job_name),
            fired_time: doc.fired_time,
            scheduled_fire_time: doc.scheduled_fire_time,
            requests_recovery: doc.requests_recovery,
            concurrent_execution_disallowed: doc.concurrent_execution_disallowed,
            priority: doc.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PausedGroupDocument {
    pub instance_name: String,
    pub group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerDocument {
    pub instance_name: String,
    pub instance_id: String,
    pub state: SchedulerRegistrationState,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_check_in: DateTime<Utc>,
    pub version: String,
    pub cluster_check_in_interval_ms: i64,
}

impl From<&SchedulerRegistration> for SchedulerDocument {
    fn from(r: &SchedulerRegistration) -> Self {
        Self {
            instance_name: r.instance_name.as_str().to_string(),
            instance_id: r.instance_id.as_str().to_string(),
            state: r.state,
            last_check_in: r.last_check_in,
            version: r.version.clone(),
            cluster_check_in_interval_ms: r.cluster_check_in_interval.num_milliseconds(),
        }
    }
}

impl From<SchedulerDocument> for SchedulerRegistration {
    fn from(doc: SchedulerDocument) -> Self {
        SchedulerRegistration {
            instance_name: schedstore_core::InstanceName::from(doc.instance_name),
            instance_id: schedstore_core::InstanceId::from(doc.instance_id),
            state: doc.state,
            last_check_in: doc.last_check_in,
            version: doc.version,
            cluster_check_in_interval: chrono::Duration::milliseconds(doc.cluster_check_in_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockWireDocument {
    pub instance_name: String,
    pub lock_type: LockType,
    pub owner: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub acquired_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expire_at: DateTime<Utc>,
}

impl From<&LockDocument> for LockWireDocument {
    fn from(l: &LockDocument) -> Self {
        Self {
            instance_name: l.instance_name.as_str().to_string(),
            lock_type: l.lock_type,
            owner: l.owner.as_str().to_string(),
            acquired_at: l.acquired_at,
            expire_at: l.expire_at,
        }
    }
}

impl From<LockWireDocument> for LockDocument {
    fn from(doc: LockWireDocument) -> Self {
        LockDocument {
            instance_name: schedstore_core::InstanceName::from(doc.instance_name),
            lock_type: doc.lock_type,
            owner: schedstore_core::InstanceId::from(doc.owner),
            acquired_at: doc.acquired_at,
            expire_at: doc.expire_at,
        }
    }
}

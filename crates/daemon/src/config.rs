// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (spec §6): bound from environment variables with
//! typed defaults, the way `daemon/src/env.rs` does it upstream — no
//! config-file framework, just explicit reads with fallback constants.

use crate::error::LifecycleError;
use schedstore_core::{InstanceId, InstanceName};

/// Configuration for one scheduler instance (spec §6's table).
#[derive(Debug, Clone)]
pub struct Config {
    /// Points at the document database; the database name is taken from the
    /// connection string itself (spec §6).
    pub connection_string: String,
    /// Prepended to every collection name.
    pub collection_prefix: String,
    /// Enables transport encryption. `MongoBackend::connect` takes the
    /// connection string as-is, so this only matters when the caller hasn't
    /// already baked `tls=true` into it — kept here so `Initialize` can warn
    /// about (and `schedstore` can report) a mismatch between the two.
    pub use_tls: bool,
    /// Physical scheduler instance identity, stable across restarts.
    pub instance_id: InstanceId,
    /// Logical cluster identity shared by every instance in this scheduler.
    pub instance_name: InstanceName,
    pub misfire_threshold: chrono::Duration,
    pub db_retry_interval: chrono::Duration,
    pub max_misfires_per_pass: i64,
    pub retryable_action_error_log_threshold: u32,
}

impl Config {
    /// Load from environment (spec §4.7 "validate configuration"):
    /// `connection_string`, `instance_id`, `instance_name` are required and
    /// non-empty; everything else falls back to spec §6's default.
    pub fn load() -> Result<Self, LifecycleError> {
        let connection_string = crate::env::connection_string().ok_or_else(|| LifecycleError::Config("SCHEDSTORE_CONNECTION_STRING is required".to_string()))?;
        let instance_id = crate::env::instance_id().ok_or_else(|| LifecycleError::Config("SCHEDSTORE_INSTANCE_ID is required".to_string()))?;
        let instance_name = crate::env::instance_name().ok_or_else(|| LifecycleError::Config("SCHEDSTORE_INSTANCE_NAME is required".to_string()))?;

        Ok(Self {
            connection_string,
            collection_prefix: crate::env::collection_prefix(),
            use_tls: crate::env::use_tls(),
            instance_id: InstanceId::from(instance_id),
            instance_name: InstanceName::from(instance_name),
            misfire_threshold: crate::env::misfire_threshold(),
            db_retry_interval: crate::env::db_retry_interval(),
            max_misfires_per_pass: crate::env::max_misfires_per_pass(),
            retryable_action_error_log_threshold: crate::env::retryable_action_error_log_threshold(),
        })
    }

    /// The database name MongoDB's driver parses out of `connection_string`
    /// (spec §6: "database name taken from URL").
    pub fn database_name(&self) -> Result<String, LifecycleError> {
        let without_scheme = self
            .connection_string
            .split_once("://")
            .map(|(_, rest)| rest)
            .ok_or_else(|| LifecycleError::Config("connection string is missing a scheme".to_string()))?;
        let after_host = without_scheme.split_once('/').map(|(_, rest)| rest).unwrap_or("");
        let name = after_host.split(['?', '#']).next().unwrap_or("");
        if name.is_empty() {
            return Err(LifecycleError::Config("connection string does not name a database".to_string()));
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

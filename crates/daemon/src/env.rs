// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate (spec §6's
//! configuration table, all keys prefixed `SCHEDSTORE_`).

pub fn connection_string() -> Option<String> {
    std::env::var("SCHEDSTORE_CONNECTION_STRING").ok().filter(|s| !s.is_empty())
}

pub fn collection_prefix() -> String {
    std::env::var("SCHEDSTORE_COLLECTION_PREFIX").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "quartz".to_string())
}

pub fn use_tls() -> bool {
    std::env::var("SCHEDSTORE_USE_TLS").ok().and_then(|s| s.parse::<bool>().ok()).unwrap_or(false)
}

pub fn instance_id() -> Option<String> {
    std::env::var("SCHEDSTORE_INSTANCE_ID").ok().filter(|s| !s.is_empty())
}

pub fn instance_name() -> Option<String> {
    std::env::var("SCHEDSTORE_INSTANCE_NAME").ok().filter(|s| !s.is_empty())
}

pub fn misfire_threshold() -> chrono::Duration {
    std::env::var("SCHEDSTORE_MISFIRE_THRESHOLD_SECS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .map(chrono::Duration::seconds)
        .unwrap_or_else(|| chrono::Duration::seconds(60))
}

pub fn db_retry_interval() -> chrono::Duration {
    std::env::var("SCHEDSTORE_DB_RETRY_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .map(chrono::Duration::seconds)
        .unwrap_or_else(|| chrono::Duration::seconds(15))
}

pub fn max_misfires_per_pass() -> i64 {
    std::env::var("SCHEDSTORE_MAX_MISFIRES_PER_PASS").ok().and_then(|s| s.parse::<i64>().ok()).unwrap_or(20)
}

pub fn retryable_action_error_log_threshold() -> u32 {
    std::env::var("SCHEDSTORE_RETRYABLE_ACTION_ERROR_LOG_THRESHOLD").ok().and_then(|s| s.parse::<u32>().ok()).unwrap_or(4)
}

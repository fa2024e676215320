// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key types shared by every entity.
//!
//! Entities are scoped by `(instance_name, ...)` composite keys (spec §3);
//! these newtypes keep the scoping explicit in signatures instead of
//! collapsing everything to `String`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved paused-group name that marks "future groups paused by default".
pub const ALL_GROUPS_PAUSED: &str = "<ALL_PAUSED>";

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype!(
    /// Logical cluster identity; all rows sharing an instance_name share state.
    InstanceName
);

string_newtype!(
    /// Physical scheduler process identity; stable across restarts.
    InstanceId
);

/// Composite key identifying a job: `(instance_name, group, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub instance_name: InstanceName,
    pub group: String,
    pub name: String,
}

impl JobKey {
    pub fn new(
        instance_name: impl Into<InstanceName>,
        group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Composite key identifying a trigger: `(instance_name, group, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerKey {
    pub instance_name: InstanceName,
    pub group: String,
    pub name: String,
}

impl TriggerKey {
    pub fn new(
        instance_name: impl Into<InstanceName>,
        group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Identifier of a fired-trigger record: `trigger_name:trigger_group:instance_id:utc_ticks`.
///
/// Kept as both the concatenated form (for the primary key) and its parts
/// (spec §3 supplement — avoids re-parsing the string during recovery scans).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiredInstanceId {
    pub trigger_name: String,
    pub trigger_group: String,
    pub instance_id: InstanceId,
    pub utc_ticks: i64,
}

impl FiredInstanceId {
    pub fn new(trigger_key: &TriggerKey, instance_id: InstanceId, utc_ticks: i64) -> Self {
        Self {
            trigger_name: trigger_key.name.clone(),
            trigger_group: trigger_key.group.clone(),
            instance_id,
            utc_ticks,
        }
    }

    /// The `trigger_name:trigger_group:instance_id` prefix used by
    /// `TriggeredJobComplete` (spec §4.6.4 step 2) to delete every fired
    /// record for a given trigger/instance pair regardless of `utc_ticks`.
    pub fn owner_prefix(&self) -> String {
        format!("{}:{}:{}", self.trigger_name, self.trigger_group, self.instance_id)
    }

    pub fn as_string(&self) -> String {
        format!("{}:{}", self.owner_prefix(), self.utc_ticks)
    }
}

impl fmt::Display for FiredInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group name matchers (spec §4.3).
//!
//! The enum is pure data; `schedstore-storage` compiles it to a regular
//! expression against the `group` field (keeps the regex dependency and the
//! actual query-building out of this crate).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupMatcher {
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Anything,
}

impl GroupMatcher {
    /// Pure reference semantics, mirrored by the compiled regex in storage —
    /// kept here so unit tests of matcher construction don't need `regex`.
    pub fn matches(&self, group: &str) -> bool {
        match self {
            GroupMatcher::Equals(s) => group == s,
            GroupMatcher::StartsWith(s) => group.starts_with(s.as_str()),
            GroupMatcher::EndsWith(s) => group.ends_with(s.as_str()),
            GroupMatcher::Contains(s) => group.contains(s.as_str()),
            GroupMatcher::Anything => true,
        }
    }
}

#[cfg(test)]
#[path = "group_matcher_tests.rs"]
mod tests;

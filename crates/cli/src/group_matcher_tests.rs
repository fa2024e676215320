// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn no_flags_matches_anything() {
    let args = GroupMatcherArgs::default();
    assert_eq!(GroupMatcher::from(&args), GroupMatcher::Anything);
}

#[test]
fn group_flag_becomes_equals() {
    let args = GroupMatcherArgs { group: Some("billing".to_string()), ..Default::default() };
    assert_eq!(GroupMatcher::from(&args), GroupMatcher::Equals("billing".to_string()));
}

#[test]
fn prefix_flag_becomes_starts_with() {
    let args = GroupMatcherArgs { prefix: Some("bill".to_string()), ..Default::default() };
    assert_eq!(GroupMatcher::from(&args), GroupMatcher::StartsWith("bill".to_string()));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiles a [`GroupMatcher`] to a regular expression against a `group`
//! field (spec §4.3).

use regex::{escape, Regex};
use schedstore_core::GroupMatcher;

pub fn compile(matcher: &GroupMatcher) -> Regex {
    let pattern = match matcher {
        GroupMatcher::Equals(g) => format!("^{}$", escape(g)),
        GroupMatcher::StartsWith(prefix) => format!("^{}", escape(prefix)),
        GroupMatcher::EndsWith(suffix) => format!("{}$", escape(suffix)),
        GroupMatcher::Contains(needle) => escape(needle),
        GroupMatcher::Anything => "^.*$".to_string(),
    };
    // Construction can only fail if `escape` produces invalid syntax, which
    // it never does; every arm above is anchored, escaped user text.
    Regex::new(&pattern).unwrap_or_else(|_| Regex::new("^$").expect("static pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_anchors_both_ends() {
        let re = compile(&GroupMatcher::Equals("billing".into()));
        assert!(re.is_match("billing"));
        assert!(!re.is_match("billing-extra"));
    }

    #[test]
    fn starts_with_anchors_prefix_only() {
        let re = compile(&GroupMatcher::StartsWith("bill".into()));
        assert!(re.is_match("billing"));
        assert!(!re.is_match("extra-bill"));
    }

    #[test]
    fn ends_with_anchors_suffix_only() {
        let re = compile(&GroupMatcher::EndsWith("ing".into()));
        assert!(re.is_match("billing"));
        assert!(!re.is_match("ingest"));
    }

    #[test]
    fn contains_matches_anywhere() {
        let re = compile(&GroupMatcher::Contains("ill".into()));
        assert!(re.is_match("billing"));
        assert!(re.is_match("grilled"));
        assert!(!re.is_match("nope"));
    }

    #[test]
    fn anything_matches_every_group() {
        let re = compile(&GroupMatcher::Anything);
        assert!(re.is_match(""));
        assert!(re.is_match("whatever"));
    }

    #[test]
    fn escapes_regex_metacharacters_in_user_supplied_group_text() {
        let re = compile(&GroupMatcher::Equals("a.b*c".into()));
        assert!(re.is_match("a.b*c"));
        assert!(!re.is_match("axbyyc"));
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Args;
use schedstore_core::GroupMatcher;

/// Shared `--group`/`--prefix`/`--suffix`/`--contains` flags, translated to a
/// [`GroupMatcher`]. At most one may be given; none selects every group.
#[derive(Args, Debug, Default)]
pub struct GroupMatcherArgs {
    /// Match a group name exactly
    #[arg(long, conflicts_with_all = ["prefix", "suffix", "contains"])]
    pub group: Option<String>,
    /// Match groups starting with this prefix
    #[arg(long, conflicts_with_all = ["group", "suffix", "contains"])]
    pub prefix: Option<String>,
    /// Match groups ending with this suffix
    #[arg(long, conflicts_with_all = ["group", "prefix", "contains"])]
    pub suffix: Option<String>,
    /// Match groups containing this substring
    #[arg(long, conflicts_with_all = ["group", "prefix", "suffix"])]
    pub contains: Option<String>,
}

impl From<&GroupMatcherArgs> for GroupMatcher {
    fn from(args: &GroupMatcherArgs) -> Self {
        if let Some(g) = &args.group {
            GroupMatcher::Equals(g.clone())
        } else if let Some(p) = &args.prefix {
            GroupMatcher::StartsWith(p.clone())
        } else if let Some(s) = &args.suffix {
            GroupMatcher::EndsWith(s.clone())
        } else if let Some(c) = &args.contains {
            GroupMatcher::Contains(c.clone())
        } else {
            GroupMatcher::Anything
        }
    }
}

#[cfg(test)]
#[path = "group_matcher_tests.rs"]
mod tests;

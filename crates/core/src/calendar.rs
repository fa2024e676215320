// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendars — opaque exclusion rulesets keyed by `(instance_name, name)`
//! (spec §3).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named exclusion ruleset. Variants model the common Quartz calendar
/// shapes (holiday/weekly/daily-window); the cron-expression calendar kind
/// is out of scope the same way cron-trigger evaluation is (spec §1
/// Non-goals) — holidays and time windows are plain date/time arithmetic,
/// not expression evaluation, so they stay in-scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Calendar {
    /// Excludes specific calendar dates (UTC).
    Holiday { excluded_dates: BTreeSet<NaiveDate> },
    /// Excludes specific days of the week.
    Weekly { excluded_days: BTreeSet<WeekdayKey> },
    /// Excludes a daily time-of-day window (e.g. maintenance blackout).
    DailyWindow { start: NaiveTime, end: NaiveTime },
    /// Never excludes anything.
    Base,
}

/// `chrono::Weekday` isn't `Ord`/`Serialize` in a way that round-trips
/// cleanly through BTreeSet; wrap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekdayKey(pub u8);

impl From<Weekday> for WeekdayKey {
    fn from(w: Weekday) -> Self {
        WeekdayKey(w.num_days_from_monday())
    }
}

impl Calendar {
    /// True if `instant` falls inside this calendar's exclusion set.
    pub fn excludes(&self, instant: DateTime<Utc>) -> bool {
        match self {
            Calendar::Holiday { excluded_dates } => excluded_dates.contains(&instant.date_naive()),
            Calendar::Weekly { excluded_days } => {
                excluded_days.contains(&WeekdayKey::from(instant.weekday()))
            }
            Calendar::DailyWindow { start, end } => {
                let t = instant.time();
                if start <= end {
                    t >= *start && t < *end
                } else {
                    // Window wraps past midnight.
                    t >= *start || t < *end
                }
            }
            Calendar::Base => false,
        }
    }

    /// Advance `instant` forward, one day at a time, until it's no longer
    /// excluded. Used by recurrence kinds to skip calendar exclusions per
    /// spec §3's "Calendar ... used to skip scheduled fires".
    pub fn next_included_time(&self, mut instant: DateTime<Utc>) -> DateTime<Utc> {
        // Bounded iteration count avoids looping forever on a pathological
        // all-excluding calendar; callers treat that as "no fire time".
        for _ in 0..3650 {
            if !self.excludes(instant) {
                return instant;
            }
            instant += chrono::Duration::days(1);
        }
        instant
    }
}

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod tests;

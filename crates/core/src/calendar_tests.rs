// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[test]
fn holiday_calendar_excludes_exact_date() {
    let mut excluded = BTreeSet::new();
    excluded.insert(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap());
    let cal = Calendar::Holiday { excluded_dates: excluded };
    assert!(cal.excludes(dt(2026, 12, 25, 9, 0)));
    assert!(!cal.excludes(dt(2026, 12, 26, 9, 0)));
}

#[test]
fn weekly_calendar_excludes_weekend() {
    let mut excluded = BTreeSet::new();
    excluded.insert(WeekdayKey::from(Weekday::Sat));
    excluded.insert(WeekdayKey::from(Weekday::Sun));
    let cal = Calendar::Weekly { excluded_days: excluded };
    // 2026-07-25 is a Saturday.
    assert!(cal.excludes(dt(2026, 7, 25, 9, 0)));
    assert!(!cal.excludes(dt(2026, 7, 27, 9, 0)));
}

#[test]
fn daily_window_excludes_maintenance_hours() {
    let cal = Calendar::DailyWindow {
        start: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        end: NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
    };
    assert!(cal.excludes(dt(2026, 7, 27, 3, 0)));
    assert!(!cal.excludes(dt(2026, 7, 27, 5, 0)));
}

#[test]
fn next_included_time_skips_forward_past_exclusions() {
    let mut excluded = BTreeSet::new();
    excluded.insert(NaiveDate::from_ymd_opt(2026, 7, 27).unwrap());
    let cal = Calendar::Holiday { excluded_dates: excluded };
    let next = cal.next_included_time(dt(2026, 7, 27, 9, 0));
    assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 7, 28).unwrap());
}

#[test]
fn base_calendar_never_excludes() {
    assert!(!Calendar::Base.excludes(dt(2026, 1, 1, 0, 0)));
}

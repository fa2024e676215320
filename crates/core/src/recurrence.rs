// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence — the tagged variant of concrete trigger schedules (spec §9
//! design note: "represent recurrence as a tagged variant ... plus an
//! interface exposing `computeFirstFireTimeUtc` and `updateAfterMisfire`").
//!
//! Evaluating an arbitrary cron expression is explicitly out of scope
//! (spec §1 Non-goals: "it does not evaluate recurrence rules, it stores
//! the result") — `Cron` holds a pre-parsed, pre-computed sequence of fire
//! instants that an external evaluator supplies; this module only walks
//! that sequence. `Simple`, `CalendarInterval`, and `DailyTimeInterval` are
//! plain date/duration arithmetic, not expression evaluation, so they are
//! fully implemented here.

use crate::calendar::Calendar;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Interface every recurrence kind implements. Named to match spec §6's
/// "Consumed from collaborators" contract (`computeFirstFireTimeUtc`,
/// `updateAfterMisfire`) under Rust naming conventions.
pub trait Recurrence {
    /// The first instant this recurrence would fire at, respecting
    /// `calendar`'s exclusions. `None` means the recurrence has no more
    /// fires (a terminal trigger).
    fn compute_first_fire_time_utc(&self, calendar: Option<&Calendar>) -> Option<DateTime<Utc>>;

    /// Recompute the next fire time after a misfire was detected at `now`
    /// (spec §4.6.5 step 4). Mutates internal counters (e.g. `times_triggered`)
    /// the way advancing through a live fire would. `None` means no more
    /// fires remain — the caller transitions the trigger to `Complete`.
    fn update_after_misfire(&mut self, calendar: Option<&Calendar>, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// Recurrence kinds a trigger can carry. Only `state_machine`/acquisition
/// care about the derived `next_fire_time`/`priority` — the arithmetic below
/// is consulted by the storage managers (spec §4.5 `store_trigger`,
/// `store_calendar` with `updateTriggers=true`) and the misfire sweep
/// (§4.6.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecurrenceRule {
    Simple(SimpleTrigger),
    Cron(CronTrigger),
    CalendarInterval(CalendarIntervalTrigger),
    DailyTimeInterval(DailyTimeIntervalTrigger),
}

impl Recurrence for RecurrenceRule {
    fn compute_first_fire_time_utc(&self, calendar: Option<&Calendar>) -> Option<DateTime<Utc>> {
        match self {
            RecurrenceRule::Simple(r) => r.compute_first_fire_time_utc(calendar),
            RecurrenceRule::Cron(r) => r.compute_first_fire_time_utc(calendar),
            RecurrenceRule::CalendarInterval(r) => r.compute_first_fire_time_utc(calendar),
            RecurrenceRule::DailyTimeInterval(r) => r.compute_first_fire_time_utc(calendar),
        }
    }

    fn update_after_misfire(&mut self, calendar: Option<&Calendar>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            RecurrenceRule::Simple(r) => r.update_after_misfire(calendar, now),
            RecurrenceRule::Cron(r) => r.update_after_misfire(calendar, now),
            RecurrenceRule::CalendarInterval(r) => r.update_after_misfire(calendar, now),
            RecurrenceRule::DailyTimeInterval(r) => r.update_after_misfire(calendar, now),
        }
    }
}

fn skip_calendar(t: DateTime<Utc>, calendar: Option<&Calendar>) -> DateTime<Utc> {
    match calendar {
        Some(cal) => cal.next_included_time(t),
        None => t,
    }
}

/// Fires every `repeat_interval`, `repeat_count` times (`None` = forever).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleTrigger {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(with = "crate::duration_serde")]
    pub repeat_interval: chrono::Duration,
    pub repeat_count: Option<u32>,
    pub times_triggered: u32,
}

impl SimpleTrigger {
    fn past_end(&self, t: DateTime<Utc>) -> bool {
        self.end_time.is_some_and(|end| t > end)
    }

    fn exhausted(&self) -> bool {
        self.repeat_count.is_some_and(|max| self.times_triggered > max)
    }
}

impl Recurrence for SimpleTrigger {
    fn compute_first_fire_time_utc(&self, calendar: Option<&Calendar>) -> Option<DateTime<Utc>> {
        if self.exhausted() {
            return None;
        }
        let candidate = skip_calendar(self.start_time, calendar);
        if self.past_end(candidate) {
            return None;
        }
        Some(candidate)
    }

    fn update_after_misfire(&mut self, calendar: Option<&Calendar>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        // "Smart policy" default for Simple triggers: reschedule to the next
        // interval boundary at/after now, preserving the fire count already
        // accumulated (spec §3 misfire_instruction supplement).
        if self.repeat_interval <= chrono::Duration::zero() {
            self.times_triggered += 1;
            return self.compute_first_fire_time_utc(calendar);
        }
        let elapsed = now - self.start_time;
        let ticks = (elapsed.num_milliseconds() / self.repeat_interval.num_milliseconds()).max(0);
        self.times_triggered = (ticks as u32).saturating_add(1);
        if self.exhausted() {
            return None;
        }
        let next = self.start_time + self.repeat_interval * (ticks as i32 + 1);
        let next = skip_calendar(next, calendar);
        if self.past_end(next) {
            return None;
        }
        Some(next)
    }
}

/// Opaque pre-computed cron schedule. The actual cron-expression evaluation
/// happens outside this crate (spec §1 Non-goals); this struct only stores
/// and walks the resulting sorted fire-time sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronTrigger {
    /// Stored for display/debugging only — never parsed here.
    pub expression: String,
    pub end_time: Option<DateTime<Utc>>,
    /// Future fire instants, ascending, as supplied by the external cron
    /// evaluator. `compute_first_fire_time_utc`/`update_after_misfire` pop
    /// from the front.
    pub upcoming: std::collections::VecDeque<DateTime<Utc>>,
}

impl Recurrence for CronTrigger {
    fn compute_first_fire_time_utc(&self, calendar: Option<&Calendar>) -> Option<DateTime<Utc>> {
        self.upcoming
            .iter()
            .find(|t| !self.end_time.is_some_and(|end| **t > end))
            .map(|t| skip_calendar(*t, calendar))
    }

    fn update_after_misfire(&mut self, calendar: Option<&Calendar>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        while let Some(front) = self.upcoming.front() {
            if *front < now {
                self.upcoming.pop_front();
                continue;
            }
            break;
        }
        self.upcoming.pop_front();
        self.compute_first_fire_time_utc(calendar)
    }
}

/// Fires every `(interval_days, interval_hours, ...)` calendar-aware step
/// (e.g. "every 1 month on the same day"), as opposed to `Simple`'s fixed
/// wall-clock duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarIntervalTrigger {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub interval_months: u32,
    pub interval_days: u32,
    pub current_fire: DateTime<Utc>,
}

impl CalendarIntervalTrigger {
    fn advance(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let stepped = if self.interval_months > 0 {
            add_months(from, self.interval_months)
        } else {
            from
        };
        stepped + chrono::Duration::days(self.interval_days as i64)
    }
}

fn add_months(t: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    use chrono::Datelike;
    let total = t.month0() + months;
    let years_add = total / 12;
    let month0 = total % 12;
    t.with_year(t.year() + years_add as i32)
        .and_then(|d| d.with_month0(month0))
        .unwrap_or(t)
}

impl Recurrence for CalendarIntervalTrigger {
    fn compute_first_fire_time_utc(&self, calendar: Option<&Calendar>) -> Option<DateTime<Utc>> {
        if self.end_time.is_some_and(|end| self.current_fire > end) {
            return None;
        }
        Some(skip_calendar(self.current_fire, calendar))
    }

    fn update_after_misfire(&mut self, calendar: Option<&Calendar>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut next = self.advance(self.current_fire);
        while next < now {
            next = self.advance(next);
        }
        self.current_fire = next;
        self.compute_first_fire_time_utc(calendar)
    }
}

/// Fires within a daily time-of-day window at a fixed interval, on a subset
/// of weekdays (Quartz's `DailyTimeIntervalTrigger`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTimeIntervalTrigger {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    #[serde(with = "crate::duration_serde")]
    pub repeat_interval: chrono::Duration,
    pub days_of_week: Vec<crate::calendar::WeekdayKey>,
    pub current_fire: DateTime<Utc>,
}

impl DailyTimeIntervalTrigger {
    fn allowed_day(&self, t: DateTime<Utc>) -> bool {
        use chrono::Datelike;
        self.days_of_week.is_empty()
            || self
                .days_of_week
                .contains(&crate::calendar::WeekdayKey::from(t.weekday()))
    }

    fn next_window_start(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let mut day = from.date_naive();
        for _ in 0..8 {
            let candidate = day.and_time(self.window_start).and_utc();
            if candidate >= from && self.allowed_day(candidate) {
                return candidate;
            }
            day += chrono::Duration::days(1);
        }
        from
    }

    fn advance(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let next = from + self.repeat_interval;
        if next.time() >= self.window_end || next.date_naive() != from.date_naive() {
            self.next_window_start(
                from.date_naive().succ_opt().unwrap_or(from.date_naive()).and_time(self.window_start).and_utc(),
            )
        } else {
            next
        }
    }
}

impl Recurrence for DailyTimeIntervalTrigger {
    fn compute_first_fire_time_utc(&self, calendar: Option<&Calendar>) -> Option<DateTime<Utc>> {
        if self.end_time.is_some_and(|end| self.current_fire > end) {
            return None;
        }
        Some(skip_calendar(self.current_fire, calendar))
    }

    fn update_after_misfire(&mut self, calendar: Option<&Calendar>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut next = self.advance(self.current_fire);
        while next < now {
            next = self.advance(next);
        }
        self.current_fire = next;
        self.compute_first_fire_time_utc(calendar)
    }
}

#[cfg(test)]
#[path = "recurrence_tests.rs"]
mod tests;

use crate::models::{AttendanceEvent, AttendanceStatus};
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayTally {
    pub present: u32,
    pub absent: u32,
}

/// Groups events by their calendar date in `offset`.
pub fn daily_tally<'a, I>(events: I, offset: &FixedOffset) -> BTreeMap<NaiveDate, DayTally>
where
    I: IntoIterator<Item = &'a AttendanceEvent>,
{
    let mut days: BTreeMap<NaiveDate, DayTally> = BTreeMap::new();
    for event in events {
        let date = event.timestamp.with_timezone(offset).date_naive();
        let tally = days.entry(date).or_default();
        match event.status {
            AttendanceStatus::Present => tally.present = tally.present.saturating_add(1),
            AttendanceStatus::Absent => tally.absent = tally.absent.saturating_add(1),
        }
    }
    days
}

/// Consecutive all-present days ending at (or just before) today.
///
/// Only dates that carry events are walked, so an undecided today and days
/// without classes are skipped rather than breaking the run. Any absence
/// ends it.
pub fn current_streak_at<'a, I>(now: DateTime<FixedOffset>, events: I) -> u32
where
    I: IntoIterator<Item = &'a AttendanceEvent>,
{
    let today = now.date_naive();
    let days = daily_tally(events, now.offset());

    let mut streak = 0u32;
    for tally in days.range(..=today).rev().map(|(_, tally)| tally) {
        if tally.absent > 0 {
            break;
        }
        if tally.present > 0 {
            streak += 1;
        }
    }
    streak
}

/// Whether any event falls on the calendar date of `now`.
pub fn marked_on_day<'a, I>(now: DateTime<FixedOffset>, events: I) -> bool
where
    I: IntoIterator<Item = &'a AttendanceEvent>,
{
    let today = now.date_naive();
    events
        .into_iter()
        .any(|event| event.timestamp.with_timezone(now.offset()).date_naive() == today)
}

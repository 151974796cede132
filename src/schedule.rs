use crate::errors::DomainError;
use crate::ledger::AttendanceLedger;
use crate::models::{EntryId, Subject, SubjectId, TimetableEntry};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Parses a 24-hour `HH:MM` string into minutes since midnight.
pub fn parse_hhmm(raw: &str) -> Result<u16, DomainError> {
    let invalid = || DomainError::InvalidTime(raw.to_string());
    let (hours, minutes) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u16 = hours.parse().map_err(|_| invalid())?;
    let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
    if hours >= 24 || minutes >= 60 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

pub fn format_hhmm(minute_of_day: u16) -> String {
    format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
}

/// A validated class slot, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub weekday: u8,
    pub subject_id: Option<SubjectId>,
    pub subject_name: String,
    pub start_minute: u16,
    pub end_minute: u16,
}

impl Slot {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.weekday > 6 {
            return Err(DomainError::InvalidWeekday(self.weekday));
        }
        if self.start_minute >= self.end_minute || self.end_minute >= MINUTES_PER_DAY {
            return Err(DomainError::InvalidTimeRange {
                start: self.start_minute,
                end: self.end_minute,
            });
        }
        if self.subject_name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        Ok(())
    }

    fn into_entry(self, id: EntryId) -> TimetableEntry {
        TimetableEntry {
            id,
            weekday: self.weekday,
            subject_id: self.subject_id,
            subject_name: self.subject_name.trim().to_string(),
            start_minute: self.start_minute,
            end_minute: self.end_minute,
        }
    }
}

/// Weekly timetable. Entries reference subjects weakly; a deleted subject
/// leaves its entries in place, unlinked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timetable {
    entries: Vec<TimetableEntry>,
}

impl Timetable {
    pub fn new(entries: Vec<TimetableEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TimetableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, slot: Slot) -> Result<&TimetableEntry, DomainError> {
        slot.validate()?;
        self.entries.push(slot.into_entry(Uuid::new_v4()));
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn update(&mut self, id: EntryId, slot: Slot) -> Result<&TimetableEntry, DomainError> {
        slot.validate()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(DomainError::UnknownEntry(id))?;
        *entry = slot.into_entry(id);
        Ok(entry)
    }

    pub fn remove(&mut self, id: EntryId) -> Result<TimetableEntry, DomainError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(DomainError::UnknownEntry(id))?;
        Ok(self.entries.remove(index))
    }

    pub fn index(&self) -> ScheduleIndex<'_> {
        ScheduleIndex::build(&self.entries)
    }
}

/// Resolves an entry's subject in the ledger. A miss is a normal
/// "unlinked" state.
pub fn linked_subject<'a>(ledger: &'a AttendanceLedger, entry: &TimetableEntry) -> Option<&'a Subject> {
    entry.subject_id.and_then(|id| ledger.get(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    NoClasses,
    Ongoing,
    Upcoming,
    AllDone,
}

/// One weekday's classes relative to a minute of that day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule<'a> {
    pub classes: Vec<&'a TimetableEntry>,
    pub ongoing: Option<&'a TimetableEntry>,
    pub upcoming: Option<&'a TimetableEntry>,
}

impl DaySchedule<'_> {
    pub fn status(&self) -> ScheduleStatus {
        if self.classes.is_empty() {
            ScheduleStatus::NoClasses
        } else if self.ongoing.is_some() {
            ScheduleStatus::Ongoing
        } else if self.upcoming.is_some() {
            ScheduleStatus::Upcoming
        } else {
            ScheduleStatus::AllDone
        }
    }
}

/// Per-weekday lookup, each day sorted by start then end minute.
#[derive(Debug, Clone, Default)]
pub struct ScheduleIndex<'a> {
    days: BTreeMap<u8, Vec<&'a TimetableEntry>>,
}

impl<'a> ScheduleIndex<'a> {
    pub fn build(entries: &'a [TimetableEntry]) -> Self {
        let mut days: BTreeMap<u8, Vec<&'a TimetableEntry>> = BTreeMap::new();
        for entry in entries {
            days.entry(entry.weekday).or_default().push(entry);
        }
        for classes in days.values_mut() {
            classes.sort_by_key(|entry| (entry.start_minute, entry.end_minute));
        }
        Self { days }
    }

    pub fn classes_on(&self, weekday: u8) -> &[&'a TimetableEntry] {
        self.days.get(&weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The earliest-starting entry with `start <= minute < end` is ongoing;
    /// the earliest with `start > minute` is upcoming.
    pub fn day_at(&self, weekday: u8, minute: u16) -> DaySchedule<'a> {
        let classes = self.classes_on(weekday).to_vec();
        let ongoing = classes
            .iter()
            .copied()
            .find(|entry| entry.start_minute <= minute && minute < entry.end_minute);
        let upcoming = classes.iter().copied().find(|entry| entry.start_minute > minute);
        DaySchedule {
            classes,
            ongoing,
            upcoming,
        }
    }

    /// Entries that start within the next `lead` minutes, excluding ones
    /// already started.
    pub fn starting_within(&self, weekday: u8, minute: u16, lead: u16) -> Vec<&'a TimetableEntry> {
        self.classes_on(weekday)
            .iter()
            .copied()
            .filter(|entry| entry.start_minute > minute && entry.start_minute - minute <= lead)
            .collect()
    }
}

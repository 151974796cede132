use crate::errors::DomainError;
use crate::models::{
    AppData, AttendanceStatus, Badge, OverviewResponse, ScheduleResponse, SettingsRequest, Subject,
    SubjectId, SubjectSummary, TimetableRequest,
};
use crate::projection::{percent, project, what_if, Projection, WhatIf, WhatIfAction};
use crate::schedule::{linked_subject, parse_hhmm, Slot};
use crate::streak::{current_streak_at, marked_on_day};
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

/// Which counters a projection runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Subject(SubjectId),
    Overall,
}

impl Scope {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw.trim() {
            "all" | "agg" | "overall" => Ok(Self::Overall),
            other => other
                .parse::<SubjectId>()
                .map(Self::Subject)
                .map_err(|_| DomainError::InvalidScope(other.to_string())),
        }
    }
}

pub fn weekday_of(now: DateTime<FixedOffset>) -> u8 {
    now.weekday().num_days_from_sunday() as u8
}

pub fn minute_of_day(now: DateTime<FixedOffset>) -> u16 {
    (now.hour() * 60 + now.minute()) as u16
}

impl AppData {
    pub fn target_percent(&self) -> u8 {
        self.app_settings.target_percent
    }

    fn counts(&self, scope: Scope) -> Result<(u64, u64), DomainError> {
        match scope {
            Scope::Overall => Ok(self.subjects.totals()),
            Scope::Subject(id) => self
                .subjects
                .get(id)
                .map(|subject| (subject.present, subject.total))
                .ok_or(DomainError::UnknownSubject(id)),
        }
    }

    pub fn projection(&self, scope: Scope) -> Result<Projection, DomainError> {
        let (present, total) = self.counts(scope)?;
        Ok(project(present, total, self.target_percent()))
    }

    pub fn what_if(&self, scope: Scope, action: WhatIfAction, count: i64) -> Result<WhatIf, DomainError> {
        let count = u64::try_from(count)
            .ok()
            .filter(|count| *count > 0)
            .ok_or(DomainError::InvalidCount)?;
        let (present, total) = self.counts(scope)?;
        Ok(what_if(present, total, self.target_percent(), action, count))
    }

    pub fn summarize(&self, subject: &Subject) -> SubjectSummary {
        let target = self.target_percent();
        let projection = project(subject.present, subject.total, target);
        let badge = match projection {
            Projection::CanMiss { classes } if classes > 0 && !self.app_settings.academic_mode => {
                Some(Badge::SafeToMiss(classes))
            }
            Projection::MustAttend { classes } => Some(Badge::AttendNext(classes)),
            _ => None,
        };
        SubjectSummary {
            id: subject.id,
            name: subject.name.clone(),
            present: subject.present,
            total: subject.total,
            percent: subject.current_percent(),
            pending_tasks: subject.pending_tasks(),
            badge,
            message: projection.message(target),
            projection,
        }
    }

    /// Summaries in ledger order, or lowest percent first. Subjects without
    /// history sort as if they were at 100%.
    pub fn summaries(&self, lowest_first: bool) -> Vec<SubjectSummary> {
        let mut summaries: Vec<SubjectSummary> =
            self.subjects.subjects().iter().map(|subject| self.summarize(subject)).collect();
        if lowest_first {
            summaries.sort_by(|a, b| sort_key(a).total_cmp(&sort_key(b)));
        }
        summaries
    }

    pub fn overview_at(&self, now: DateTime<FixedOffset>) -> OverviewResponse {
        let (present, total) = self.subjects.totals();
        let target = self.target_percent();
        let projection = project(present, total, target);
        OverviewResponse {
            present,
            total,
            absent: total.saturating_sub(present),
            percent: percent(present, total),
            target_percent: target,
            message: projection.message(target),
            projection,
            streak: current_streak_at(now, self.subjects.events()),
        }
    }

    pub fn schedule_at(&self, now: DateTime<FixedOffset>) -> ScheduleResponse {
        let weekday = weekday_of(now);
        let minute = minute_of_day(now);
        let index = self.timetable.index();
        let day = index.day_at(weekday, minute);
        ScheduleResponse {
            weekday,
            minute_of_day: minute,
            status: day.status(),
            ongoing_subject: day
                .ongoing
                .and_then(|entry| linked_subject(&self.subjects, entry))
                .map(|subject| subject.id),
            ongoing: day.ongoing.cloned(),
            upcoming: day.upcoming.cloned(),
            classes: day.classes.into_iter().cloned().collect(),
        }
    }

    /// Whether today's timetable has classes but nothing was marked yet.
    pub fn needs_reminder_at(&self, now: DateTime<FixedOffset>) -> bool {
        let index = self.timetable.index();
        !index.classes_on(weekday_of(now)).is_empty() && !marked_on_day(now, self.subjects.events())
    }

    /// Marks every linked class of today absent, one event per entry.
    pub fn sick_day_at(&mut self, now: DateTime<FixedOffset>) -> Vec<SubjectId> {
        let weekday = weekday_of(now);
        let targets: Vec<SubjectId> = self
            .timetable
            .index()
            .classes_on(weekday)
            .iter()
            .filter_map(|entry| linked_subject(&self.subjects, entry))
            .map(|subject| subject.id)
            .collect();

        let at = now.with_timezone(&Utc);
        for id in &targets {
            // ids were resolved from this ledger just above
            let _ = self.subjects.record_event(*id, AttendanceStatus::Absent, at);
        }
        targets
    }

    /// Builds a timetable slot, resolving the subject name from the ledger
    /// when only an id is given.
    pub fn slot_from_request(&self, request: &TimetableRequest) -> Result<Slot, DomainError> {
        let start_minute = parse_hhmm(&request.from)?;
        let end_minute = parse_hhmm(&request.to)?;
        let subject_name = match (&request.subject_name, request.subject_id) {
            (Some(name), _) if !name.trim().is_empty() => name.trim().to_string(),
            (_, Some(id)) => self
                .subjects
                .get(id)
                .map(|subject| subject.name.clone())
                .ok_or(DomainError::UnknownSubject(id))?,
            _ => return Err(DomainError::EmptyName),
        };
        let subject_id = request
            .subject_id
            .or_else(|| self.subjects.find_by_name(&subject_name).map(|subject| subject.id));
        Ok(Slot {
            weekday: request.weekday,
            subject_id,
            subject_name,
            start_minute,
            end_minute,
        })
    }

    /// Applies a settings patch. Nothing changes if the target is invalid.
    pub fn update_settings(&mut self, request: SettingsRequest) -> Result<(), DomainError> {
        let target = match request.target_percent {
            Some(value) => Some(
                u8::try_from(value)
                    .ok()
                    .filter(|value| *value <= 100)
                    .ok_or(DomainError::InvalidTarget(value))?,
            ),
            None => None,
        };
        let settings = &mut self.app_settings;
        if let Some(target) = target {
            settings.target_percent = target;
        }
        if let Some(primary) = request.theme_primary {
            settings.theme_primary = primary;
        }
        if let Some(accent) = request.theme_accent {
            settings.theme_accent = accent;
        }
        if let Some(dark_mode) = request.dark_mode {
            settings.dark_mode = dark_mode;
        }
        if let Some(academic_mode) = request.academic_mode {
            settings.academic_mode = academic_mode;
        }
        Ok(())
    }
}

fn sort_key(summary: &SubjectSummary) -> f64 {
    if summary.total == 0 { 100.0 } else { summary.percent }
}

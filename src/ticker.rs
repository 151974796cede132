use crate::config::AppConfig;
use crate::models::{AppData, EntryId};
use crate::schedule::format_hhmm;
use crate::session::{minute_of_day, weekday_of};
use crate::state::AppState;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub date_changed: bool,
    pub refresh_schedule: bool,
    pub notices: Vec<ClassNotice>,
    pub reminder_due: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNotice {
    pub entry: EntryId,
    pub subject_name: String,
    pub starts_in: u16,
    pub start_minute: u16,
}

/// Once-per-second clock bookkeeping. Only its own dedup state moves; the
/// data it reads is never touched.
#[derive(Debug, Clone)]
pub struct Ticker {
    current_date: NaiveDate,
    reminded_on: Option<NaiveDate>,
    notified: HashSet<(NaiveDate, EntryId)>,
    reminder_hour: u32,
    notify_lead_minutes: u16,
}

impl Ticker {
    pub fn new(now: DateTime<FixedOffset>, reminder_hour: u32, notify_lead_minutes: u16) -> Self {
        Self {
            current_date: now.date_naive(),
            reminded_on: None,
            notified: HashSet::new(),
            reminder_hour,
            notify_lead_minutes,
        }
    }

    pub fn on_tick(&mut self, now: DateTime<FixedOffset>, data: &AppData) -> TickOutcome {
        let today = now.date_naive();
        let mut outcome = TickOutcome::default();

        if today != self.current_date {
            self.current_date = today;
            self.notified.retain(|(date, _)| *date == today);
            outcome.date_changed = true;
        }
        outcome.refresh_schedule = outcome.date_changed || now.second() == 0;

        if now.second() == 0 || now.second() == 30 {
            let index = data.timetable.index();
            let minute = minute_of_day(now);
            for entry in index.starting_within(weekday_of(now), minute, self.notify_lead_minutes) {
                if self.notified.insert((today, entry.id)) {
                    outcome.notices.push(ClassNotice {
                        entry: entry.id,
                        subject_name: entry.subject_name.clone(),
                        starts_in: entry.start_minute - minute,
                        start_minute: entry.start_minute,
                    });
                }
            }
        }

        if now.hour() >= self.reminder_hour
            && self.reminded_on != Some(today)
            && data.needs_reminder_at(now)
        {
            self.reminded_on = Some(today);
            outcome.reminder_due = true;
        }

        outcome
    }
}

/// Drives a [`Ticker`] off the state's clock for the life of the process.
pub async fn run(state: AppState, config: AppConfig) {
    let mut ticker = Ticker::new(state.clock.now(), config.reminder_hour, config.notify_lead_minutes);
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        let now = state.clock.now();
        let outcome = {
            let data = state.data.lock().await;
            ticker.on_tick(now, &data)
        };

        if outcome.date_changed {
            info!(date = %now.date_naive(), "date changed, refreshing schedule");
        } else if outcome.refresh_schedule {
            debug!("refreshing today's schedule");
        }
        for notice in &outcome.notices {
            info!(
                entry = %notice.entry,
                "upcoming class: {} starts in {} minutes at {}",
                notice.subject_name,
                notice.starts_in,
                format_hhmm(notice.start_minute)
            );
        }
        if outcome.reminder_due {
            info!("no attendance marked today, reminder due");
        }
    }
}

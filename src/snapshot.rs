//! Stored document shapes and their normalization into [`AppData`].
//!
//! Everything that may be missing or in an older layout is optional here;
//! [`normalize`] is the single place where defaults are filled in, so the
//! rest of the crate only ever sees fully populated entities.

use crate::errors::DomainError;
use crate::ledger::AttendanceLedger;
use crate::models::{AppData, AppSettings, AttendanceEvent, Subject, SubjectId, Task, TimetableEntry};
use crate::schedule::{parse_hhmm, Slot, Timetable};
use chrono::NaiveDate;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub subjects: Option<Vec<Lenient<StoredSubject>>>,
    pub timetable: Option<Vec<Lenient<StoredEntry>>>,
    pub app_settings: Option<Lenient<AppSettings>>,
}

/// One element of a stored collection. A malformed element is kept as its
/// decode error and dropped during normalization instead of failing the
/// whole document.
#[derive(Debug)]
pub struct Lenient<T>(Result<T, String>);

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(serde_json::from_value(value).map_err(|err| err.to_string())))
    }
}

impl<T> Lenient<T> {
    fn decoded(self, what: &str) -> Option<T> {
        self.0
            .inspect_err(|err| warn!("dropping malformed {what}: {err}"))
            .ok()
    }
}

fn keep_decoded<T>(items: Option<Vec<Lenient<T>>>, what: &str) -> Vec<T> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| item.decoded(what))
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct StoredSubject {
    pub id: Option<SubjectId>,
    pub name: String,
    #[serde(default)]
    pub present: i64,
    #[serde(default)]
    pub total: i64,
    pub history: Option<Vec<Lenient<AttendanceEvent>>>,
    pub tasks: Option<Vec<Lenient<StoredTask>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTask {
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Current(TimetableEntry),
    /// `{day, sub, from: "HH:MM", to: "HH:MM"}` with a name-only subject.
    /// `day` shows up both as a number and as a numeric string.
    Legacy {
        #[serde(deserialize_with = "weekday_number_or_text")]
        day: u8,
        sub: String,
        from: String,
        to: String,
    },
}

fn weekday_number_or_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(day) => Ok(day),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid weekday {text:?}"))),
    }
}

/// Parses a stored document for startup. Missing collections are empty.
pub fn load_document(bytes: &[u8]) -> Result<AppData, serde_json::Error> {
    let stored: StoredDocument = serde_json::from_slice(bytes)?;
    Ok(normalize(stored))
}

/// Parses an uploaded backup. Unlike startup loading, `subjects` and
/// `timetable` must both be present.
pub fn parse_import(bytes: &[u8]) -> Result<AppData, DomainError> {
    let stored: StoredDocument =
        serde_json::from_slice(bytes).map_err(|err| DomainError::InvalidImport(err.to_string()))?;
    if stored.subjects.is_none() {
        return Err(DomainError::InvalidImport("missing subjects".to_string()));
    }
    if stored.timetable.is_none() {
        return Err(DomainError::InvalidImport("missing timetable".to_string()));
    }
    Ok(normalize(stored))
}

pub fn normalize(stored: StoredDocument) -> AppData {
    let subjects: Vec<Subject> = keep_decoded(stored.subjects, "subject")
        .into_iter()
        .map(normalize_subject)
        .collect();
    let ledger = AttendanceLedger::new(subjects);

    let entries = keep_decoded(stored.timetable, "timetable entry")
        .into_iter()
        .filter_map(|entry| normalize_entry(entry, &ledger))
        .collect();

    let mut app_settings = stored
        .app_settings
        .and_then(|settings| settings.decoded("settings"))
        .unwrap_or_default();
    app_settings.target_percent = app_settings.target_percent.min(100);

    AppData {
        subjects: ledger,
        timetable: Timetable::new(entries),
        app_settings,
    }
}

fn normalize_subject(stored: StoredSubject) -> Subject {
    let present = stored_count(&stored.name, "present", stored.present);
    let total = stored_count(&stored.name, "total", stored.total);
    Subject {
        id: stored.id.unwrap_or_else(Uuid::new_v4),
        name: stored.name,
        present,
        total,
        history: keep_decoded(stored.history, "history event"),
        tasks: keep_decoded(stored.tasks, "task")
            .into_iter()
            .map(|task| Task {
                text: task.text,
                done: task.done,
                due_date: task
                    .due_date
                    .as_deref()
                    .map(str::trim)
                    .filter(|raw| !raw.is_empty())
                    .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()),
            })
            .collect(),
    }
}

/// Counters below zero are stored as 0.
fn stored_count(subject: &str, field: &str, raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or_else(|_| {
        warn!("{subject}: {field} count {raw} is negative, using 0");
        0
    })
}

fn normalize_entry(stored: StoredEntry, ledger: &AttendanceLedger) -> Option<TimetableEntry> {
    let (id, slot) = match stored {
        StoredEntry::Current(entry) => (
            entry.id,
            Slot {
                weekday: entry.weekday,
                subject_id: entry.subject_id,
                subject_name: entry.subject_name,
                start_minute: entry.start_minute,
                end_minute: entry.end_minute,
            },
        ),
        StoredEntry::Legacy { day, sub, from, to } => {
            let (start_minute, end_minute) = match (parse_hhmm(&from), parse_hhmm(&to)) {
                (Ok(start), Ok(end)) => (start, end),
                (Err(err), _) | (_, Err(err)) => {
                    warn!("dropping timetable entry for {sub}: {err}");
                    return None;
                }
            };
            let slot = Slot {
                weekday: day,
                subject_id: ledger.find_by_name(&sub).map(|subject| subject.id),
                subject_name: sub,
                start_minute,
                end_minute,
            };
            (Uuid::new_v4(), slot)
        }
    };

    if let Err(err) = slot.validate() {
        warn!("dropping timetable entry {id}: {err}");
        return None;
    }
    Some(TimetableEntry {
        id,
        weekday: slot.weekday,
        subject_id: slot.subject_id,
        subject_name: slot.subject_name,
        start_minute: slot.start_minute,
        end_minute: slot.end_minute,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use chrono::{TimeZone, Utc};

    #[test]
    fn missing_history_and_tasks_default_to_empty() {
        let data = load_document(br#"{"subjects":[{"name":"Java","present":3,"total":4}]}"#).unwrap();
        let subject = &data.subjects.subjects()[0];
        assert_eq!(subject.name, "Java");
        assert_eq!((subject.present, subject.total), (3, 4));
        assert!(subject.history.is_empty());
        assert!(subject.tasks.is_empty());
        assert!(data.timetable.is_empty());
        assert_eq!(data.app_settings, AppSettings::default());
    }

    #[test]
    fn legacy_backup_is_migrated() {
        let raw = br##"{
            "subjects": [{
                "name": "Cloud Computing Theory",
                "present": 1,
                "total": 2,
                "history": [
                    {"date": "2026-03-02T04:30:00.000Z", "status": "P"},
                    {"date": "2026-03-03T04:30:00.000Z", "status": "A"}
                ],
                "tasks": [{"text": "lab file", "done": false, "dueDate": ""}]
            }],
            "timetable": [
                {"day": 1, "sub": "Cloud Computing Theory", "from": "09:30", "to": "10:20"},
                {"day": 2, "sub": "Placement Training", "from": "13:00", "to": "14:00"},
                {"day": 3, "sub": "Broken", "from": "15:00", "to": "14:00"}
            ],
            "appSettings": {"themePrimary": "#ff4757", "darkMode": true}
        }"##;
        let data = parse_import(raw).unwrap();

        let subject = &data.subjects.subjects()[0];
        assert_eq!(subject.history.len(), 2);
        assert_eq!(
            subject.history[0].timestamp,
            Utc.with_ymd_and_hms(2026, 3, 2, 4, 30, 0).unwrap()
        );
        assert_eq!(subject.history[1].status, AttendanceStatus::Absent);
        assert_eq!(subject.tasks[0].due_date, None);

        let entries = data.timetable.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject_id, Some(subject.id));
        assert_eq!((entries[0].start_minute, entries[0].end_minute), (570, 620));
        assert_eq!(entries[1].subject_id, None);
        assert_eq!(entries[1].subject_name, "Placement Training");

        assert!(data.app_settings.dark_mode);
        assert_eq!(data.app_settings.theme_primary, "#ff4757");
        assert_eq!(data.app_settings.theme_accent, "#a29bfe");
        assert_eq!(data.app_settings.target_percent, 75);
    }

    #[test]
    fn string_weekdays_are_accepted() {
        let data = load_document(
            br#"{
                "subjects": [{"name": "Java", "present": 3, "total": 4}],
                "timetable": [
                    {"day": "1", "sub": "Java", "from": "09:00", "to": "10:00"},
                    {"day": " 4 ", "sub": "Seminar", "from": "11:00", "to": "12:00"}
                ]
            }"#,
        )
        .unwrap();

        let java = data.subjects.find_by_name("Java").unwrap();
        assert_eq!((java.present, java.total), (3, 4));
        let entries = data.timetable.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].weekday, entries[0].subject_id), (1, Some(java.id)));
        assert_eq!(entries[1].weekday, 4);
    }

    #[test]
    fn negative_counts_are_clamped() {
        let data = load_document(
            br#"{"subjects": [
                {"name": "Java", "present": -2, "total": 5},
                {"name": "Cloud", "present": 1, "total": 1}
            ]}"#,
        )
        .unwrap();

        let counts: Vec<(&str, u64, u64)> = data
            .subjects
            .subjects()
            .iter()
            .map(|subject| (subject.name.as_str(), subject.present, subject.total))
            .collect();
        assert_eq!(counts, vec![("Java", 0, 5), ("Cloud", 1, 1)]);
    }

    #[test]
    fn malformed_elements_are_dropped_individually() {
        let data = load_document(
            br#"{
                "subjects": [
                    {"name": "Java", "present": 1, "total": 2,
                     "history": [{"date": "yesterday", "status": "P"}, {"date": "2026-03-02T04:30:00Z", "status": "A"}],
                     "tasks": [{"done": true}, {"text": "viva", "dueDate": "2026-03-20"}]},
                    {"present": 4},
                    {"name": "Cloud", "present": "many"}
                ],
                "timetable": [
                    {"day": "monday", "sub": "Java", "from": "09:00", "to": "10:00"},
                    {"day": 2, "sub": "Java", "from": "09:00", "to": "10:00"},
                    42
                ],
                "appSettings": {"targetPercent": "high"}
            }"#,
        )
        .unwrap();

        assert_eq!(data.subjects.len(), 1);
        let java = &data.subjects.subjects()[0];
        assert_eq!(java.history.len(), 1);
        assert_eq!(java.history[0].status, AttendanceStatus::Absent);
        assert_eq!(java.tasks.len(), 1);
        assert_eq!(java.tasks[0].due_date, NaiveDate::from_ymd_opt(2026, 3, 20));
        assert_eq!(data.timetable.len(), 1);
        assert_eq!(data.timetable.entries()[0].weekday, 2);
        assert_eq!(data.app_settings, AppSettings::default());
    }

    #[test]
    fn import_requires_subjects_and_timetable() {
        assert_eq!(
            parse_import(br#"{"subjects": []}"#).unwrap_err(),
            DomainError::InvalidImport("missing timetable".to_string())
        );
        assert_eq!(
            parse_import(br#"{"timetable": []}"#).unwrap_err(),
            DomainError::InvalidImport("missing subjects".to_string())
        );
        assert!(matches!(parse_import(b"not json"), Err(DomainError::InvalidImport(_))));
    }

    #[test]
    fn export_then_import_is_identical() {
        let mut data = AppData::default();
        let id = data.subjects.add_subject("Networks").unwrap().id;
        data.subjects
            .record_event(id, AttendanceStatus::Present, Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 7).unwrap())
            .unwrap();
        data.subjects
            .add_task(id, "viva prep", NaiveDate::from_ymd_opt(2026, 3, 20))
            .unwrap();
        data.timetable
            .add(Slot {
                weekday: 0,
                subject_id: Some(id),
                subject_name: "Networks".to_string(),
                start_minute: 600,
                end_minute: 660,
            })
            .unwrap();
        data.app_settings.target_percent = 80;

        let exported = serde_json::to_vec(&data).unwrap();
        assert_eq!(parse_import(&exported).unwrap(), data);
    }
}

use crate::ledger::AttendanceLedger;
use crate::projection::{percent, Projection};
use crate::schedule::{ScheduleStatus, Timetable};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SubjectId = Uuid;
pub type EntryId = Uuid;

pub const DEFAULT_TARGET_PERCENT: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub text: String,
    pub done: bool,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub present: u64,
    pub total: u64,
    pub history: Vec<AttendanceEvent>,
    pub tasks: Vec<Task>,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            present: 0,
            total: 0,
            history: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// `present / total` as a percentage; 0 when nothing is recorded yet.
    pub fn current_percent(&self) -> f64 {
        percent(self.present, self.total)
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| !task.done).count()
    }
}

/// Weekly recurring class slot. `subject_name` is display-only; the
/// ledger linkage goes through `subject_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: EntryId,
    pub weekday: u8,
    pub subject_id: Option<SubjectId>,
    pub subject_name: String,
    pub start_minute: u16,
    pub end_minute: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub target_percent: u8,
    pub theme_primary: String,
    pub theme_accent: String,
    pub dark_mode: bool,
    pub academic_mode: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            target_percent: DEFAULT_TARGET_PERCENT,
            theme_primary: "#6c5ce7".to_string(),
            theme_accent: "#a29bfe".to_string(),
            dark_mode: false,
            academic_mode: false,
        }
    }
}

/// The whole persisted document. Doubles as the export format.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub subjects: AttendanceLedger,
    pub timetable: Timetable,
    pub app_settings: AppSettings,
}

#[derive(Debug, Deserialize)]
pub struct NewSubjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EditSubjectRequest {
    pub name: Option<String>,
    pub present: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub text: String,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    pub weekday: u8,
    pub subject_id: Option<SubjectId>,
    pub subject_name: Option<String>,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub target_percent: Option<i64>,
    pub theme_primary: Option<String>,
    pub theme_accent: Option<String>,
    pub dark_mode: Option<bool>,
    pub academic_mode: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectListQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WhatIfQuery {
    pub subject: String,
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncTotalsRequest {
    pub present: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "classes", rename_all = "snake_case")]
pub enum Badge {
    SafeToMiss(u64),
    AttendNext(u64),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub id: SubjectId,
    pub name: String,
    pub present: u64,
    pub total: u64,
    pub percent: f64,
    pub pending_tasks: usize,
    pub badge: Option<Badge>,
    pub projection: Projection,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub present: u64,
    pub total: u64,
    pub absent: u64,
    pub percent: f64,
    pub target_percent: u8,
    pub projection: Projection,
    pub message: String,
    pub streak: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub weekday: u8,
    pub minute_of_day: u16,
    pub status: ScheduleStatus,
    pub classes: Vec<TimetableEntry>,
    pub ongoing: Option<TimetableEntry>,
    pub upcoming: Option<TimetableEntry>,
    pub ongoing_subject: Option<SubjectId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SickDayResponse {
    pub marked: Vec<SubjectId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub subjects: usize,
    pub timetable: usize,
}

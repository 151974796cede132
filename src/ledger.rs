use crate::errors::DomainError;
use crate::models::{AttendanceEvent, AttendanceStatus, Subject, SubjectId, Task};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Name of the subject that holds totals pulled from a remote server.
pub const SYNCED_SUBJECT_NAME: &str = "Synced (Server)";

/// Per-subject attendance counters and event history, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttendanceLedger {
    subjects: Vec<Subject>,
}

impl AttendanceLedger {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn get(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.id == id)
    }

    /// First subject with this exact name. Names are not unique.
    pub fn find_by_name(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.name == name)
    }

    fn subject_mut(&mut self, id: SubjectId) -> Result<&mut Subject, DomainError> {
        self.subjects
            .iter_mut()
            .find(|subject| subject.id == id)
            .ok_or(DomainError::UnknownSubject(id))
    }

    pub fn add_subject(&mut self, name: &str) -> Result<&Subject, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::EmptyName);
        }
        self.subjects.push(Subject::new(name));
        Ok(&self.subjects[self.subjects.len() - 1])
    }

    pub fn record_event(
        &mut self,
        id: SubjectId,
        status: AttendanceStatus,
        at: DateTime<Utc>,
    ) -> Result<&Subject, DomainError> {
        let subject = self.subject_mut(id)?;
        subject.total = subject.total.saturating_add(1);
        if status == AttendanceStatus::Present {
            subject.present = subject.present.saturating_add(1);
        }
        subject.history.push(AttendanceEvent {
            timestamp: at,
            status,
        });
        Ok(subject)
    }

    /// Overwrites both counters. History is left alone, and `present > total`
    /// is stored as given.
    pub fn set_counts(&mut self, id: SubjectId, present: i64, total: i64) -> Result<&Subject, DomainError> {
        let (Ok(present), Ok(total)) = (u64::try_from(present), u64::try_from(total)) else {
            return Err(DomainError::NegativeCount);
        };
        let subject = self.subject_mut(id)?;
        subject.present = present;
        subject.total = total;
        Ok(subject)
    }

    /// Blank names keep the current one.
    pub fn rename(&mut self, id: SubjectId, name: &str) -> Result<&Subject, DomainError> {
        let subject = self.subject_mut(id)?;
        let name = name.trim();
        if !name.is_empty() {
            subject.name = name.to_string();
        }
        Ok(subject)
    }

    pub fn delete_subject(&mut self, id: SubjectId) -> Result<Subject, DomainError> {
        let index = self
            .subjects
            .iter()
            .position(|subject| subject.id == id)
            .ok_or(DomainError::UnknownSubject(id))?;
        Ok(self.subjects.remove(index))
    }

    /// Summed `(present, total)` across every subject.
    pub fn totals(&self) -> (u64, u64) {
        self.subjects.iter().fold((0u64, 0u64), |(present, total), subject| {
            (present.saturating_add(subject.present), total.saturating_add(subject.total))
        })
    }

    pub fn events(&self) -> impl Iterator<Item = &AttendanceEvent> {
        self.subjects.iter().flat_map(|subject| subject.history.iter())
    }

    pub fn add_task(
        &mut self,
        id: SubjectId,
        text: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<&Subject, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::EmptyTask);
        }
        let subject = self.subject_mut(id)?;
        subject.tasks.push(Task {
            text: text.to_string(),
            done: false,
            due_date,
        });
        Ok(subject)
    }

    pub fn toggle_task(&mut self, id: SubjectId, index: usize) -> Result<&Subject, DomainError> {
        let subject = self.subject_mut(id)?;
        let task = subject.tasks.get_mut(index).ok_or(DomainError::UnknownTask(index))?;
        task.done = !task.done;
        Ok(subject)
    }

    pub fn delete_task(&mut self, id: SubjectId, index: usize) -> Result<&Subject, DomainError> {
        let subject = self.subject_mut(id)?;
        if index >= subject.tasks.len() {
            return Err(DomainError::UnknownTask(index));
        }
        subject.tasks.remove(index);
        Ok(subject)
    }

    /// Stores server-side totals under [`SYNCED_SUBJECT_NAME`], creating the
    /// subject on first use.
    pub fn upsert_synced(&mut self, present: u64, total: u64) -> &Subject {
        let index = match self
            .subjects
            .iter()
            .position(|subject| subject.name == SYNCED_SUBJECT_NAME)
        {
            Some(index) => index,
            None => {
                self.subjects.push(Subject::new(SYNCED_SUBJECT_NAME));
                self.subjects.len() - 1
            }
        };
        let subject = &mut self.subjects[index];
        subject.present = present;
        subject.total = total;
        subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn add_subject_starts_empty() {
        let mut ledger = AttendanceLedger::default();
        let subject = ledger.add_subject("  Cloud Computing ").unwrap().clone();
        assert_eq!(subject.name, "Cloud Computing");
        assert_eq!((subject.present, subject.total), (0, 0));
        assert!(subject.history.is_empty());
        assert!(subject.tasks.is_empty());
        assert_eq!(ledger.add_subject("   ").unwrap_err(), DomainError::EmptyName);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn record_present_increments_both_counts() {
        let mut ledger = AttendanceLedger::default();
        let id = ledger.add_subject("Networks").unwrap().id;
        ledger.set_counts(id, 10, 10).unwrap();

        let subject = ledger.record_event(id, AttendanceStatus::Present, at(9)).unwrap();
        assert_eq!((subject.present, subject.total), (11, 11));
        assert_eq!(
            subject.history,
            vec![AttendanceEvent {
                timestamp: at(9),
                status: AttendanceStatus::Present
            }]
        );
    }

    #[test]
    fn record_absent_only_increments_total() {
        let mut ledger = AttendanceLedger::default();
        let id = ledger.add_subject("Java").unwrap().id;
        ledger.record_event(id, AttendanceStatus::Absent, at(9)).unwrap();
        ledger.record_event(id, AttendanceStatus::Present, at(10)).unwrap();
        let subject = ledger.get(id).unwrap();
        assert_eq!((subject.present, subject.total), (1, 2));
        assert_eq!(subject.history[0].status, AttendanceStatus::Absent);
        assert_eq!(subject.current_percent(), 50.0);
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let mut ledger = AttendanceLedger::default();
        let id = uuid::Uuid::new_v4();
        assert_eq!(
            ledger.record_event(id, AttendanceStatus::Present, at(9)).unwrap_err(),
            DomainError::UnknownSubject(id)
        );
        assert!(ledger.get(id).is_none());
    }

    #[test]
    fn set_counts_keeps_history_and_allows_present_above_total() {
        let mut ledger = AttendanceLedger::default();
        let id = ledger.add_subject("Graphics").unwrap().id;
        ledger.record_event(id, AttendanceStatus::Present, at(9)).unwrap();

        let subject = ledger.set_counts(id, 7, 5).unwrap();
        assert_eq!((subject.present, subject.total), (7, 5));
        assert_eq!(subject.history.len(), 1);

        assert_eq!(ledger.set_counts(id, -1, 5).unwrap_err(), DomainError::NegativeCount);
        assert_eq!(ledger.get(id).unwrap().present, 7);
    }

    #[test]
    fn rename_ignores_blank_names() {
        let mut ledger = AttendanceLedger::default();
        let id = ledger.add_subject("Old").unwrap().id;
        ledger.rename(id, "  ").unwrap();
        assert_eq!(ledger.get(id).unwrap().name, "Old");
        ledger.rename(id, "New").unwrap();
        assert_eq!(ledger.get(id).unwrap().name, "New");
    }

    #[test]
    fn delete_removes_subject() {
        let mut ledger = AttendanceLedger::default();
        let id = ledger.add_subject("Aptitude").unwrap().id;
        ledger.delete_subject(id).unwrap();
        assert!(ledger.is_empty());
        assert!(ledger.delete_subject(id).is_err());
    }

    #[test]
    fn totals_sum_every_subject() {
        let mut ledger = AttendanceLedger::default();
        let a = ledger.add_subject("A").unwrap().id;
        let b = ledger.add_subject("B").unwrap().id;
        ledger.set_counts(a, 3, 4).unwrap();
        ledger.set_counts(b, 5, 8).unwrap();
        assert_eq!(ledger.totals(), (8, 12));
        assert_eq!(AttendanceLedger::default().totals(), (0, 0));
    }

    #[test]
    fn tasks_toggle_and_delete() {
        let mut ledger = AttendanceLedger::default();
        let id = ledger.add_subject("Cloud").unwrap().id;
        ledger.add_task(id, "lab record", None).unwrap();
        ledger.add_task(id, "assignment 2", NaiveDate::from_ymd_opt(2026, 3, 9)).unwrap();
        assert_eq!(ledger.add_task(id, " ", None).unwrap_err(), DomainError::EmptyTask);

        assert_eq!(ledger.toggle_task(id, 0).unwrap().pending_tasks(), 1);
        let subject = ledger.delete_task(id, 1).unwrap();
        assert_eq!(subject.tasks.len(), 1);
        assert!(subject.tasks[0].done);
        assert_eq!(ledger.toggle_task(id, 5).unwrap_err(), DomainError::UnknownTask(5));
    }

    #[test]
    fn synced_totals_upsert_into_one_subject() {
        let mut ledger = AttendanceLedger::default();
        let first = ledger.upsert_synced(40, 50).id;
        let second = ledger.upsert_synced(42, 52);
        assert_eq!(second.id, first);
        assert_eq!((second.present, second.total), (42, 52));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.find_by_name(SYNCED_SUBJECT_NAME).is_some());
    }
}

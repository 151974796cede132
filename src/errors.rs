use crate::models::{EntryId, SubjectId};
use axum::http::StatusCode;
use std::fmt;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnknownSubject(_) | DomainError::UnknownTask(_) | DomainError::UnknownEntry(_) => {
                Self::not_found(err.to_string())
            }
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Rejections raised by ledger, timetable and settings operations.
///
/// None of these leave state partially mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    EmptyName,
    EmptyTask,
    NegativeCount,
    InvalidCount,
    InvalidTarget(i64),
    InvalidWeekday(u8),
    InvalidTime(String),
    InvalidTimeRange { start: u16, end: u16 },
    UnknownSubject(SubjectId),
    UnknownTask(usize),
    UnknownEntry(EntryId),
    InvalidScope(String),
    InvalidImport(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "subject name must not be empty"),
            Self::EmptyTask => write!(f, "task text must not be empty"),
            Self::NegativeCount => write!(f, "present and total must not be negative"),
            Self::InvalidCount => write!(f, "count must be a positive number"),
            Self::InvalidTarget(value) => write!(f, "target percent {value} is outside 0..=100"),
            Self::InvalidWeekday(day) => write!(f, "weekday {day} is outside 0..=6"),
            Self::InvalidTime(raw) => write!(f, "'{raw}' is not a valid HH:MM time"),
            Self::InvalidTimeRange { start, end } => {
                write!(f, "invalid class time range {start}..{end} (minutes of day)")
            }
            Self::UnknownSubject(id) => write!(f, "subject {id} not found"),
            Self::UnknownTask(index) => write!(f, "task {index} not found"),
            Self::UnknownEntry(id) => write!(f, "timetable entry {id} not found"),
            Self::InvalidScope(raw) => write!(f, "'{raw}' is neither a subject id nor 'all'"),
            Self::InvalidImport(reason) => write!(f, "invalid backup file: {reason}"),
        }
    }
}

impl std::error::Error for DomainError {}

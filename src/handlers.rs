use crate::errors::{AppError, DomainError};
use crate::models::{
    AppData, AppSettings, AttendanceEvent, AttendanceRequest, AttendanceStatus, EditSubjectRequest, EntryId,
    ImportResponse, NewSubjectRequest, NewTaskRequest, OverviewResponse, ScheduleResponse, SettingsRequest,
    SickDayResponse, SubjectId, SubjectListQuery, SubjectSummary, SyncTotalsRequest, TimetableEntry,
    TimetableRequest, WhatIfQuery,
};
use crate::projection::{WhatIf, WhatIfAction};
use crate::session::Scope;
use crate::snapshot::parse_import;
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

pub async fn list_subjects(
    State(state): State<AppState>,
    Query(query): Query<SubjectListQuery>,
) -> Json<Vec<SubjectSummary>> {
    let lowest_first = query.sort.as_deref().map(str::trim) == Some("lowest");
    let data = state.data.lock().await;
    Json(data.summaries(lowest_first))
}

pub async fn add_subject(
    State(state): State<AppState>,
    Json(payload): Json<NewSubjectRequest>,
) -> Result<(StatusCode, Json<SubjectSummary>), AppError> {
    let mut data = state.data.lock().await;
    let id = data.subjects.add_subject(&payload.name)?.id;
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(summary(&data, id)?)))
}

pub async fn edit_subject(
    State(state): State<AppState>,
    Path(id): Path<SubjectId>,
    Json(payload): Json<EditSubjectRequest>,
) -> Result<Json<SubjectSummary>, AppError> {
    let mut data = state.data.lock().await;
    data.subjects.set_counts(id, payload.present, payload.total)?;
    if let Some(name) = payload.name.as_deref() {
        data.subjects.rename(id, name)?;
    }
    persist_data(&state.data_path, &data).await?;
    Ok(Json(summary(&data, id)?))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<SubjectId>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    let removed = data.subjects.delete_subject(id)?;
    persist_data(&state.data_path, &data).await?;
    info!(subject = %removed.id, "deleted subject {}", removed.name);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_attendance(
    State(state): State<AppState>,
    Path(id): Path<SubjectId>,
    Json(payload): Json<AttendanceRequest>,
) -> Result<Json<SubjectSummary>, AppError> {
    let status = match payload.status.trim() {
        "present" => AttendanceStatus::Present,
        "absent" => AttendanceStatus::Absent,
        _ => return Err(AppError::bad_request("status must be 'present' or 'absent'")),
    };

    let now = state.clock.now().with_timezone(&Utc);
    let mut data = state.data.lock().await;
    data.subjects.record_event(id, status, now)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(summary(&data, id)?))
}

/// Newest first.
pub async fn subject_history(
    State(state): State<AppState>,
    Path(id): Path<SubjectId>,
) -> Result<Json<Vec<AttendanceEvent>>, AppError> {
    let data = state.data.lock().await;
    let subject = data.subjects.get(id).ok_or(DomainError::UnknownSubject(id))?;
    Ok(Json(subject.history.iter().rev().cloned().collect()))
}

pub async fn add_task(
    State(state): State<AppState>,
    Path(id): Path<SubjectId>,
    Json(payload): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<SubjectSummary>), AppError> {
    let mut data = state.data.lock().await;
    data.subjects.add_task(id, &payload.text, payload.due_date)?;
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(summary(&data, id)?)))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path((id, index)): Path<(SubjectId, usize)>,
) -> Result<Json<SubjectSummary>, AppError> {
    let mut data = state.data.lock().await;
    data.subjects.toggle_task(id, index)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(summary(&data, id)?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path((id, index)): Path<(SubjectId, usize)>,
) -> Result<Json<SubjectSummary>, AppError> {
    let mut data = state.data.lock().await;
    data.subjects.delete_task(id, index)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(summary(&data, id)?))
}

pub async fn get_overview(State(state): State<AppState>) -> Json<OverviewResponse> {
    let now = state.clock.now();
    let data = state.data.lock().await;
    Json(data.overview_at(now))
}

pub async fn get_what_if(
    State(state): State<AppState>,
    Query(query): Query<WhatIfQuery>,
) -> Result<Json<WhatIf>, AppError> {
    let scope = Scope::parse(&query.subject)?;
    let action = WhatIfAction::parse(&query.action)
        .ok_or_else(|| AppError::bad_request("action must be 'miss' or 'attend'"))?;
    let data = state.data.lock().await;
    Ok(Json(data.what_if(scope, action, query.count)?))
}

pub async fn list_timetable(State(state): State<AppState>) -> Json<Vec<TimetableEntry>> {
    let data = state.data.lock().await;
    let index = data.timetable.index();
    let entries = (0..=6u8)
        .flat_map(|weekday| index.classes_on(weekday).iter().map(|entry| (*entry).clone()))
        .collect();
    Json(entries)
}

pub async fn add_timetable_entry(
    State(state): State<AppState>,
    Json(payload): Json<TimetableRequest>,
) -> Result<(StatusCode, Json<TimetableEntry>), AppError> {
    let mut data = state.data.lock().await;
    let slot = data.slot_from_request(&payload)?;
    let entry = data.timetable.add(slot)?.clone();
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn edit_timetable_entry(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Json(payload): Json<TimetableRequest>,
) -> Result<Json<TimetableEntry>, AppError> {
    let mut data = state.data.lock().await;
    let slot = data.slot_from_request(&payload)?;
    let entry = data.timetable.update(id, slot)?.clone();
    persist_data(&state.data_path, &data).await?;
    Ok(Json(entry))
}

pub async fn delete_timetable_entry(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    data.timetable.remove(id)?;
    persist_data(&state.data_path, &data).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_today_schedule(State(state): State<AppState>) -> Json<ScheduleResponse> {
    let now = state.clock.now();
    let data = state.data.lock().await;
    Json(data.schedule_at(now))
}

pub async fn sick_day(State(state): State<AppState>) -> Result<Json<SickDayResponse>, AppError> {
    let now = state.clock.now();
    let mut data = state.data.lock().await;
    let marked = data.sick_day_at(now);
    if !marked.is_empty() {
        persist_data(&state.data_path, &data).await?;
    }
    info!("sick day marked {} classes absent", marked.len());
    Ok(Json(SickDayResponse { marked }))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<AppSettings> {
    let data = state.data.lock().await;
    Json(data.app_settings.clone())
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsRequest>,
) -> Result<Json<AppSettings>, AppError> {
    let mut data = state.data.lock().await;
    data.update_settings(payload)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(data.app_settings.clone()))
}

pub async fn export_data(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let date = state.clock.now().date_naive();
    let data = state.data.lock().await;
    let payload = serde_json::to_vec_pretty(&*data).map_err(AppError::internal)?;
    let disposition = format!("attachment; filename=\"Backup_{date}.json\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        payload,
    ))
}

/// Replaces the whole document. A rejected upload leaves memory and disk as
/// they were.
pub async fn import_data(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportResponse>, AppError> {
    let imported = parse_import(&body).inspect_err(|err| warn!("rejected import: {err}"))?;
    let response = ImportResponse {
        subjects: imported.subjects.len(),
        timetable: imported.timetable.len(),
    };

    let mut data = state.data.lock().await;
    persist_data(&state.data_path, &imported).await?;
    *data = imported;
    info!(subjects = response.subjects, timetable = response.timetable, "restored backup");
    Ok(Json(response))
}

pub async fn sync_totals(
    State(state): State<AppState>,
    Json(payload): Json<SyncTotalsRequest>,
) -> Result<Json<SubjectSummary>, AppError> {
    let mut data = state.data.lock().await;
    let id = data.subjects.upsert_synced(payload.present, payload.total).id;
    persist_data(&state.data_path, &data).await?;
    info!(present = payload.present, total = payload.total, "merged server totals");
    Ok(Json(summary(&data, id)?))
}

fn summary(data: &AppData, id: SubjectId) -> Result<SubjectSummary, AppError> {
    let subject = data.subjects.get(id).ok_or(DomainError::UnknownSubject(id))?;
    Ok(data.summarize(subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Arc;

    fn fixed_state(name: &str) -> AppState {
        // Monday 2026-03-02 09:30 at +05:30.
        let now = FixedOffset::east_opt(19800)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, 9, 30, 0)
            .unwrap();
        let mut path = std::env::temp_dir();
        path.push(format!("attendance_handlers_{}_{name}.json", std::process::id()));
        AppState::new(path, AppData::default(), Arc::new(FixedClock(now)))
    }

    async fn new_subject(state: &AppState, name: &str) -> SubjectId {
        let (status, Json(summary)) = add_subject(
            State(state.clone()),
            Json(NewSubjectRequest { name: name.to_string() }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        summary.id
    }

    #[tokio::test]
    async fn attendance_uses_injected_clock() {
        let state = fixed_state("clock");
        let id = new_subject(&state, "Java").await;

        record_attendance(
            State(state.clone()),
            Path(id),
            Json(AttendanceRequest { status: "present".to_string() }),
        )
        .await
        .unwrap();

        let Json(history) = subject_history(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, state.clock.now().with_timezone(&Utc));

        let Json(overview) = get_overview(State(state.clone())).await;
        assert_eq!(overview.streak, 1);
        let _ = tokio::fs::remove_file(&state.data_path).await;
    }

    #[tokio::test]
    async fn sick_day_marks_todays_classes() {
        let state = fixed_state("sick");
        let id = new_subject(&state, "Networks").await;
        let request = TimetableRequest {
            weekday: 1,
            subject_id: Some(id),
            subject_name: None,
            from: "09:00".to_string(),
            to: "10:00".to_string(),
        };
        add_timetable_entry(State(state.clone()), Json(request)).await.unwrap();

        let Json(schedule) = get_today_schedule(State(state.clone())).await;
        assert_eq!(schedule.ongoing_subject, Some(id));

        let Json(response) = sick_day(State(state.clone())).await.unwrap();
        assert_eq!(response.marked, vec![id]);
        let data = state.data.lock().await;
        let subject = data.subjects.get(id).unwrap();
        assert_eq!((subject.present, subject.total), (0, 1));
        drop(data);
        let _ = tokio::fs::remove_file(&state.data_path).await;
    }

    #[tokio::test]
    async fn failed_import_leaves_state_alone() {
        let state = fixed_state("import");
        new_subject(&state, "Cloud").await;
        let err = import_data(State(state.clone()), Bytes::from_static(br#"{"subjects": []}"#))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(state.data.lock().await.subjects.len(), 1);
        let _ = tokio::fs::remove_file(&state.data_path).await;
    }
}

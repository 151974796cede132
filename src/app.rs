use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/subjects", get(handlers::list_subjects).post(handlers::add_subject))
        .route(
            "/api/subjects/:id",
            put(handlers::edit_subject).delete(handlers::delete_subject),
        )
        .route("/api/subjects/:id/attendance", post(handlers::record_attendance))
        .route("/api/subjects/:id/history", get(handlers::subject_history))
        .route("/api/subjects/:id/tasks", post(handlers::add_task))
        .route("/api/subjects/:id/tasks/:index/toggle", post(handlers::toggle_task))
        .route("/api/subjects/:id/tasks/:index", delete(handlers::delete_task))
        .route("/api/overview", get(handlers::get_overview))
        .route("/api/what-if", get(handlers::get_what_if))
        .route(
            "/api/timetable",
            get(handlers::list_timetable).post(handlers::add_timetable_entry),
        )
        .route(
            "/api/timetable/:id",
            put(handlers::edit_timetable_entry).delete(handlers::delete_timetable_entry),
        )
        .route("/api/schedule/today", get(handlers::get_today_schedule))
        .route("/api/sick-day", post(handlers::sick_day))
        .route("/api/settings", get(handlers::get_settings).put(handlers::update_settings))
        .route("/api/export", get(handlers::export_data))
        .route("/api/import", post(handlers::import_data))
        .route("/api/sync/totals", post(handlers::sync_totals))
        .with_state(state)
}

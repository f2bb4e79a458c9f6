use crate::{
    AppState,
    handlers::{dashboard, districts, documents, initiatives, notes, reports, tasks, users},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every handler here receives a resolved `AuthUser`. Reads are narrowed to the
/// actor's district scope in the repository; writes go through the ownership
/// checks in `policy`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session & Uploads ---
        .route("/me", get(users::get_me))
        // POST /upload/presigned
        // Short-lived PUT URL for a direct upload; the key is generated server-side.
        .route("/upload/presigned", post(documents::get_presigned_url))
        // --- Dashboard ---
        .route("/dashboard", get(dashboard::get_overview))
        .route("/api/dashboard-stats", get(dashboard::get_stats))
        .route("/api/chart-data", get(dashboard::get_chart_data))
        .route("/api/notifications", get(dashboard::get_notifications))
        .route("/api/ai/summary", get(dashboard::get_summary))
        .route("/api/ai/suggestions", get(dashboard::get_suggestions))
        .route("/timeline", get(dashboard::get_timeline))
        .route("/calendar", get(dashboard::get_calendar))
        // --- Districts (read-only here; management is under /admin) ---
        .route("/districts", get(districts::list_districts))
        .route("/districts/{id}", get(districts::get_district))
        // --- Initiatives ---
        .route(
            "/initiatives",
            get(initiatives::list_initiatives).post(initiatives::create_initiative),
        )
        .route(
            "/initiatives/{id}",
            get(initiatives::get_initiative)
                .put(initiatives::update_initiative)
                .delete(initiatives::delete_initiative),
        )
        .route("/initiatives/{id}/sheets", post(initiatives::add_sheet))
        .route("/initiatives/{id}/events", post(initiatives::add_event))
        // --- Tasks ---
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        // POST /tasks/{id}/update-status
        // Form-encoded; always answers {"success": bool}.
        .route("/tasks/{id}/update-status", post(tasks::update_task_status))
        // --- Notes ---
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note).put(notes::update_note).delete(notes::delete_note),
        )
        // --- Documents ---
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/{id}",
            get(documents::get_document).delete(documents::delete_document),
        )
        // --- Reports ---
        .route("/reports/initiatives", get(reports::initiatives_report))
        .route("/reports/tasks", get(reports::tasks_report))
        .route("/reports/export", get(reports::export_csv))
}

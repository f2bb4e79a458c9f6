use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    models::{InitiativeFilter, TaskFilter},
    policy::scope,
    reports::{self, ExportKind, InitiativeReportRow, TasksReport},
};

#[utoipa::path(
    get,
    path = "/reports/initiatives",
    responses((status = 200, description = "Per-initiative task counts and progress", body = [InitiativeReportRow]))
)]
pub async fn initiatives_report(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<InitiativeReportRow>>> {
    let visible = scope(&actor);
    let initiatives = state.repo.list_initiatives(&visible, &InitiativeFilter::default()).await?;
    let tasks = state.repo.list_tasks(&visible, &TaskFilter::default()).await?;
    Ok(Json(reports::initiatives_report(initiatives, &tasks)))
}

#[utoipa::path(
    get,
    path = "/reports/tasks",
    responses((status = 200, description = "Tasks with overdue totals", body = TasksReport))
)]
pub async fn tasks_report(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<TasksReport>> {
    let tasks = state.repo.list_tasks(&scope(&actor), &TaskFilter::default()).await?;
    Ok(Json(reports::tasks_report(tasks, Utc::now())))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `initiatives` (default) or `tasks`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// export_csv
///
/// Downloads the actor's scoped initiatives or tasks as CSV.
#[utoipa::path(
    get,
    path = "/reports/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 422, description = "Unknown export type")
    )
)]
pub async fn export_csv(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let kind = match query.kind.as_deref().map(str::trim) {
        None | Some("") => ExportKind::default(),
        Some(raw) => raw.parse::<ExportKind>()?,
    };

    let visible = scope(&actor);
    let body = match kind {
        ExportKind::Initiatives => {
            let initiatives = state.repo.list_initiatives(&visible, &InitiativeFilter::default()).await?;
            reports::initiatives_csv(&initiatives)?
        }
        ExportKind::Tasks => {
            let tasks = state.repo.list_tasks(&visible, &TaskFilter::default()).await?;
            reports::tasks_csv(&tasks, Utc::now())?
        }
    };

    tracing::info!(actor = %actor.id, file = kind.filename(), bytes = body.len(), "csv export");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.filename()),
            ),
        ],
        body,
    ))
}

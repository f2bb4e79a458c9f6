//! Dashboard feeds. Each handler loads the actor's scoped collections once and
//! hands them to the pure functions in `reports`.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    models::{DateRange, Initiative, InitiativeFilter, NoteFilter, Task, TaskFilter},
    policy::{Actor, scope},
    reports::{
        self, CalendarEntry, ChartData, DashboardOverview, DashboardStats, NotificationsResponse, Summary,
        SuggestionsResponse,
    },
};

async fn scoped_work(state: &AppState, actor: &Actor) -> AppResult<(Vec<Initiative>, Vec<Task>)> {
    let visible = scope(actor);
    let initiatives = state.repo.list_initiatives(&visible, &InitiativeFilter::default()).await?;
    let tasks = state.repo.list_tasks(&visible, &TaskFilter::default()).await?;
    Ok((initiatives, tasks))
}

/// get_overview
///
/// Landing page payload: counters, the five newest tasks and notes, and the
/// districts and coordinators the actor can see.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard overview", body = DashboardOverview))
)]
pub async fn get_overview(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<DashboardOverview>> {
    let visible = scope(&actor);
    let (initiatives, tasks) = scoped_work(&state, &actor).await?;
    let mut recent_notes = state.repo.list_notes(&visible, &NoteFilter::default()).await?;
    recent_notes.truncate(5);

    Ok(Json(DashboardOverview {
        stats: reports::dashboard_stats(&initiatives, &tasks, Utc::now()),
        recent_tasks: reports::recent_tasks(&tasks, 5),
        recent_notes,
        districts: state.repo.list_districts(&visible).await?,
        coordinators: state.repo.list_coordinators(&visible).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/dashboard-stats",
    responses((status = 200, description = "Scoped counters", body = DashboardStats))
)]
pub async fn get_stats(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let (initiatives, tasks) = scoped_work(&state, &actor).await?;
    Ok(Json(reports::dashboard_stats(&initiatives, &tasks, Utc::now())))
}

/// get_chart_data
///
/// Initiatives and tasks created per month over the last six months.
#[utoipa::path(
    get,
    path = "/api/chart-data",
    responses((status = 200, description = "Chart.js payload", body = ChartData))
)]
pub async fn get_chart_data(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<ChartData>> {
    let (initiatives, tasks) = scoped_work(&state, &actor).await?;
    Ok(Json(reports::monthly_chart(&initiatives, &tasks, Utc::now())))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses((status = 200, description = "Overdue task warnings", body = NotificationsResponse))
)]
pub async fn get_notifications(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<NotificationsResponse>> {
    let tasks = state.repo.list_tasks(&scope(&actor), &TaskFilter::default()).await?;
    Ok(Json(NotificationsResponse {
        notifications: reports::notifications(&tasks, Utc::now()),
    }))
}

#[utoipa::path(
    get,
    path = "/api/ai/summary",
    responses((status = 200, description = "Plain-language summary", body = Summary))
)]
pub async fn get_summary(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<Summary>> {
    let (initiatives, tasks) = scoped_work(&state, &actor).await?;
    let stats = reports::dashboard_stats(&initiatives, &tasks, Utc::now());
    Ok(Json(reports::summary(stats)))
}

#[utoipa::path(
    get,
    path = "/api/ai/suggestions",
    responses((status = 200, description = "Rule-based next steps", body = SuggestionsResponse))
)]
pub async fn get_suggestions(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<SuggestionsResponse>> {
    let (initiatives, tasks) = scoped_work(&state, &actor).await?;
    Ok(Json(SuggestionsResponse {
        suggestions: reports::suggestions(&initiatives, &tasks, Utc::now()),
    }))
}

#[utoipa::path(
    get,
    path = "/timeline",
    responses((status = 200, description = "Most recently created tasks", body = [Task]))
)]
pub async fn get_timeline(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<Task>>> {
    let tasks = state.repo.list_tasks(&scope(&actor), &TaskFilter::default()).await?;
    Ok(Json(reports::timeline(&tasks)))
}

/// get_calendar
///
/// Events and task due dates, optionally bounded by `from` and `to` (inclusive dates).
#[utoipa::path(
    get,
    path = "/calendar",
    params(DateRange),
    responses((status = 200, description = "Chronological calendar entries", body = [CalendarEntry]))
)]
pub async fn get_calendar(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> AppResult<Json<Vec<CalendarEntry>>> {
    let visible = scope(&actor);
    let events = state.repo.list_events(&visible, &range, None).await?;
    let tasks = state.repo.list_tasks(&visible, &TaskFilter::default()).await?;
    Ok(Json(reports::calendar(events, &tasks, &range)))
}

mod common;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use common::*;
use district_dashboard::{
    choices::TaskStatus,
    models::Task,
    reports::{
        CalendarEntry, CalendarEntryKind, ChartData, DashboardOverview, DashboardStats, InitiativeReportRow,
        NotificationsResponse, SuggestionKind, SuggestionsResponse, Summary, TasksReport,
    },
};
use uuid::Uuid;

fn overdue_task(world: &World, title: &str, days_late: i64) -> Task {
    world.repo.insert_task(Task {
        id: Uuid::new_v4(),
        title: title.to_string(),
        initiative_id: world.makerspace.id,
        assigned_to: world.c1.id,
        created_by: world.c1.id,
        status: TaskStatus::InProgress,
        progress: 40,
        due_date: Utc::now() - Duration::days(days_late),
        created_at: Utc::now() - Duration::days(30),
        updated_at: Utc::now(),
        ..Task::default()
    })
}

#[tokio::test]
async fn stats_are_scoped() {
    let world = World::new().await;
    overdue_task(&world, "Late", 1);

    let response = expect_status(world.app(), get("/api/dashboard-stats", &world.c1), StatusCode::OK).await;
    let stats: DashboardStats = body_json(response).await;
    assert_eq!(stats.total_initiatives, 1);
    assert_eq!(stats.active_initiatives, 1);
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.overdue_tasks, 1);

    let response = expect_status(world.app(), get("/api/dashboard-stats", &world.c2), StatusCode::OK).await;
    let stats: DashboardStats = body_json(response).await;
    assert_eq!(stats, DashboardStats::default());
}

#[tokio::test]
async fn notifications_list_overdue_tasks_latest_due_first() {
    let world = World::new().await;
    overdue_task(&world, "Very late", 9);
    overdue_task(&world, "Slightly late", 1);

    let response = expect_status(world.app(), get("/api/notifications", &world.c1), StatusCode::OK).await;
    let feed: NotificationsResponse = body_json(response).await;
    assert_eq!(feed.notifications.len(), 2);
    assert_eq!(feed.notifications[0].message, "Task \"Slightly late\" is overdue");
    assert_eq!(feed.notifications[0].kind, "warning");

    let response = expect_status(world.app(), get("/api/notifications", &world.c2), StatusCode::OK).await;
    let feed: NotificationsResponse = body_json(response).await;
    assert!(feed.notifications.is_empty());
}

#[tokio::test]
async fn chart_has_six_buckets_and_two_series() {
    let world = World::new().await;
    let response = expect_status(world.app(), get("/api/chart-data", &world.admin), StatusCode::OK).await;
    let raw: serde_json::Value = body_json(response).await;
    assert!(raw["datasets"][0]["backgroundColor"].is_string());

    let chart: ChartData = serde_json::from_value(raw).unwrap();
    assert_eq!(chart.labels.len(), 6);
    assert_eq!(chart.datasets.len(), 2);
    assert!(chart.datasets.iter().all(|d| d.data.len() == 6));
}

#[tokio::test]
async fn summary_and_suggestions() {
    let world = World::new().await;
    overdue_task(&world, "Late", 2);

    let response = expect_status(world.app(), get("/api/ai/summary", &world.c1), StatusCode::OK).await;
    let summary: Summary = body_json(response).await;
    assert!(summary.summary.contains("1 task is overdue"));

    let response = expect_status(world.app(), get("/api/ai/suggestions", &world.c1), StatusCode::OK).await;
    let suggestions: SuggestionsResponse = body_json(response).await;
    assert_eq!(suggestions.suggestions[0].kind, SuggestionKind::FollowUp);

    let response = expect_status(world.app(), get("/api/ai/suggestions", &world.c2), StatusCode::OK).await;
    let suggestions: SuggestionsResponse = body_json(response).await;
    assert_eq!(suggestions.suggestions.len(), 1);
    assert_eq!(suggestions.suggestions[0].kind, SuggestionKind::OnTrack);
}

#[tokio::test]
async fn overview_and_timeline() {
    let world = World::new().await;

    let response = expect_status(world.app(), get("/dashboard", &world.c1), StatusCode::OK).await;
    let overview: DashboardOverview = body_json(response).await;
    assert_eq!(overview.recent_tasks.len(), 1);
    assert_eq!(overview.districts.len(), 1);
    assert_eq!(overview.coordinators.len(), 1);

    let response = expect_status(world.app(), get("/dashboard", &world.admin), StatusCode::OK).await;
    let overview: DashboardOverview = body_json(response).await;
    assert_eq!(overview.districts.len(), 2);
    assert_eq!(overview.coordinators.len(), 2);

    let response = expect_status(world.app(), get("/timeline", &world.c1), StatusCode::OK).await;
    let timeline: Vec<Task> = body_json(response).await;
    assert_eq!(timeline[0].id, world.kickoff.id);
}

#[tokio::test]
async fn calendar_respects_window() {
    let world = World::new().await;
    let due = world.kickoff.due_date.date_naive();

    let uri = format!("/calendar?from={due}&to={due}");
    let response = expect_status(world.app(), get(&uri, &world.c1), StatusCode::OK).await;
    let entries: Vec<CalendarEntry> = body_json(response).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, CalendarEntryKind::TaskDue);

    let before = due - Duration::days(1);
    let uri = format!("/calendar?to={before}");
    let response = expect_status(world.app(), get(&uri, &world.c1), StatusCode::OK).await;
    let entries: Vec<CalendarEntry> = body_json(response).await;
    assert!(entries.is_empty());
}

#[tokio::test]
async fn initiative_and_task_reports() {
    let world = World::new().await;
    overdue_task(&world, "Late", 3);

    let response = expect_status(world.app(), get("/reports/initiatives", &world.c1), StatusCode::OK).await;
    let rows: Vec<InitiativeReportRow> = body_json(response).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].task_count, 2);
    assert_eq!(rows[0].completed_tasks, 0);
    assert_eq!(rows[0].average_progress, 20.0);

    let response = expect_status(world.app(), get("/reports/tasks", &world.c1), StatusCode::OK).await;
    let report: TasksReport = body_json(response).await;
    assert_eq!(report.total, 2);
    assert_eq!(report.overdue, 1);
}

#[tokio::test]
async fn csv_export_defaults_to_initiatives() {
    let world = World::new().await;

    let response = expect_status(world.app(), get("/reports/export", &world.c1), StatusCode::OK).await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"initiatives.csv\""
    );
    let body = body_text(response).await;
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("Title,District,Coordinator,Type,Status,Start Date,End Date")
    );
    assert_eq!(lines.next(), Some("Makerspace,Batticaloa,c1,Other,Active,2024-01-01,"));
}

#[tokio::test]
async fn csv_export_of_tasks_is_scoped() {
    let world = World::new().await;

    let response = expect_status(world.app(), get("/reports/export?type=tasks", &world.c2), StatusCode::OK).await;
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"tasks.csv\""
    );
    let body = body_text(response).await;
    assert_eq!(body.lines().count(), 1);

    expect_status(
        world.app(),
        get("/reports/export?type=projects", &world.c1),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
}

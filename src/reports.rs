//! Derived reporting over already-scoped collections.
//!
//! Nothing in here touches storage or knows about actors: callers pass the
//! lists the repository returned for the actor's scope, so every counter and
//! feed is scoped by construction.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    choices::{InitiativeStatus, TaskStatus},
    error::{AppError, AppResult},
    models::{DateRange, District, Event, Initiative, Note, Task, User},
};

// --- Statistics ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DashboardStats {
    pub total_initiatives: usize,
    pub active_initiatives: usize,
    pub completed_initiatives: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    /// Tasks whose completion stamp falls within the last 7 days.
    pub weekly_completed_tasks: usize,
}

pub fn dashboard_stats(initiatives: &[Initiative], tasks: &[Task], now: DateTime<Utc>) -> DashboardStats {
    let week_ago = now - Duration::days(7);
    DashboardStats {
        total_initiatives: initiatives.len(),
        active_initiatives: initiatives.iter().filter(|i| i.status == InitiativeStatus::Active).count(),
        completed_initiatives: initiatives.iter().filter(|i| i.status == InitiativeStatus::Completed).count(),
        total_tasks: tasks.len(),
        completed_tasks: tasks.iter().filter(|t| t.status == TaskStatus::Completed).count(),
        overdue_tasks: tasks.iter().filter(|t| t.is_overdue(now)).count(),
        weekly_completed_tasks: tasks
            .iter()
            .filter(|t| t.completed_at.is_some_and(|at| at >= week_ago))
            .count(),
    }
}

/// Arithmetic mean of task progress; 0 for an empty set.
pub fn average_progress<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> f64 {
    let (sum, count) = tasks
        .into_iter()
        .fold((0i64, 0u32), |(sum, count), t| (sum + i64::from(t.progress), count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / f64::from(count)
    }
}

// --- Chart ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<usize>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
}

/// Chart.js-shaped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// monthly_chart
///
/// Six buckets, oldest first. Bucket `i` (6 down to 1) is the calendar month
/// containing `now - 30*i days`, so two buckets can land on the same month near
/// month boundaries; each still counts that whole month.
pub fn monthly_chart(initiatives: &[Initiative], tasks: &[Task], now: DateTime<Utc>) -> ChartData {
    let mut labels = Vec::with_capacity(6);
    let mut initiative_counts = Vec::with_capacity(6);
    let mut task_counts = Vec::with_capacity(6);

    for i in (1..=6).rev() {
        let month = now - Duration::days(30 * i);
        let same_month = |at: &DateTime<Utc>| at.year() == month.year() && at.month() == month.month();
        labels.push(month.format("%b").to_string());
        initiative_counts.push(initiatives.iter().filter(|x| same_month(&x.created_at)).count());
        task_counts.push(tasks.iter().filter(|x| same_month(&x.created_at)).count());
    }

    ChartData {
        labels,
        datasets: vec![
            ChartDataset {
                label: "Initiatives".to_string(),
                data: initiative_counts,
                background_color: "rgba(54, 162, 235, 0.5)".to_string(),
                border_color: "rgba(54, 162, 235, 1)".to_string(),
                border_width: 2,
            },
            ChartDataset {
                label: "Tasks".to_string(),
                data: task_counts,
                background_color: "rgba(255, 99, 132, 0.5)".to_string(),
                border_color: "rgba(255, 99, 132, 1)".to_string(),
                border_width: 2,
            },
        ],
    }
}

// --- Reports ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct InitiativeReportRow {
    pub initiative: Initiative,
    pub task_count: usize,
    pub completed_tasks: usize,
    pub average_progress: f64,
}

pub fn initiatives_report(initiatives: Vec<Initiative>, tasks: &[Task]) -> Vec<InitiativeReportRow> {
    let mut by_initiative: HashMap<Uuid, Vec<&Task>> = HashMap::new();
    for task in tasks {
        by_initiative.entry(task.initiative_id).or_default().push(task);
    }
    initiatives
        .into_iter()
        .map(|initiative| {
            let own = by_initiative.get(&initiative.id).map(Vec::as_slice).unwrap_or_default();
            InitiativeReportRow {
                task_count: own.len(),
                completed_tasks: own.iter().filter(|t| t.status == TaskStatus::Completed).count(),
                average_progress: average_progress(own.iter().copied()),
                initiative,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TasksReport {
    pub total: usize,
    pub overdue: usize,
    pub tasks: Vec<Task>,
}

pub fn tasks_report(tasks: Vec<Task>, now: DateTime<Utc>) -> TasksReport {
    TasksReport {
        total: tasks.len(),
        overdue: tasks.iter().filter(|t| t.is_overdue(now)).count(),
        tasks,
    }
}

// --- Feeds ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub url: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

/// Up to five overdue tasks, latest due date first.
pub fn notifications(tasks: &[Task], now: DateTime<Utc>) -> Vec<Notification> {
    let mut overdue: Vec<&Task> = tasks.iter().filter(|t| t.is_overdue(now)).collect();
    overdue.sort_by(|a, b| b.due_date.cmp(&a.due_date));
    overdue
        .into_iter()
        .take(5)
        .map(|task| Notification {
            kind: "warning".to_string(),
            message: format!("Task \"{}\" is overdue", task.title),
            url: format!("/tasks/{}", task.id),
            time: task.due_date.format("%Y-%m-%d").to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Summary {
    pub summary: String,
    pub stats: DashboardStats,
}

/// One plain-language paragraph built from the counters.
pub fn summary(stats: DashboardStats) -> Summary {
    let mut text = if stats.total_initiatives == 0 {
        "There are no initiatives yet.".to_string()
    } else {
        format!(
            "{} of {} initiatives are active and {} completed.",
            stats.active_initiatives, stats.total_initiatives, stats.completed_initiatives
        )
    };
    if stats.total_tasks > 0 {
        let rate = stats.completed_tasks * 100 / stats.total_tasks;
        text.push_str(&format!(
            " {} of {} tasks are done ({rate}%), {} completed this week.",
            stats.completed_tasks, stats.total_tasks, stats.weekly_completed_tasks
        ));
    }
    match stats.overdue_tasks {
        0 => text.push_str(" Nothing is overdue."),
        1 => text.push_str(" 1 task is overdue and needs attention."),
        n => text.push_str(&format!(" {n} tasks are overdue and need attention.")),
    }
    Summary { summary: text, stats }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SuggestionKind {
    FollowUp,
    Stalled,
    Plan,
    OnTrack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

const SUGGESTIONS_PER_RULE: usize = 5;

/// suggestions
///
/// Rule-based, in this order: overdue follow-ups, stalled tasks (under 25%
/// and due within 7 days), active initiatives with no tasks. Each rule
/// contributes at most five entries. An empty result becomes a single
/// "on track" entry.
pub fn suggestions(initiatives: &[Initiative], tasks: &[Task], now: DateTime<Utc>) -> Vec<Suggestion> {
    let mut out = Vec::new();

    out.extend(
        tasks
            .iter()
            .filter(|t| t.is_overdue(now))
            .take(SUGGESTIONS_PER_RULE)
            .map(|t| Suggestion {
                kind: SuggestionKind::FollowUp,
                message: format!(
                    "Follow up with {} on overdue task \"{}\".",
                    if t.assignee_name.is_empty() { "the assignee" } else { t.assignee_name.as_str() },
                    t.title
                ),
                url: Some(format!("/tasks/{}", t.id)),
            }),
    );

    let soon = now + Duration::days(7);
    out.extend(
        tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed && t.progress < 25)
            .filter(|t| t.due_date >= now && t.due_date <= soon)
            .take(SUGGESTIONS_PER_RULE)
            .map(|t| Suggestion {
                kind: SuggestionKind::Stalled,
                message: format!(
                    "Task \"{}\" is due {} but only {}% complete.",
                    t.title,
                    t.due_date.format("%Y-%m-%d"),
                    t.progress
                ),
                url: Some(format!("/tasks/{}", t.id)),
            }),
    );

    out.extend(
        initiatives
            .iter()
            .filter(|i| i.status == InitiativeStatus::Active)
            .filter(|i| !tasks.iter().any(|t| t.initiative_id == i.id))
            .take(SUGGESTIONS_PER_RULE)
            .map(|i| Suggestion {
                kind: SuggestionKind::Plan,
                message: format!("Initiative \"{}\" has no tasks yet. Break it down into tasks.", i.title),
                url: Some(format!("/initiatives/{}", i.id)),
            }),
    );

    if out.is_empty() {
        out.push(Suggestion {
            kind: SuggestionKind::OnTrack,
            message: "Everything is on track.".to_string(),
            url: None,
        });
    }
    out
}

/// The `limit` most recently created tasks.
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Activity timeline: the 20 most recently created tasks.
pub fn timeline(tasks: &[Task]) -> Vec<Task> {
    recent_tasks(tasks, 20)
}

// --- Calendar ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CalendarEntryKind {
    Event,
    TaskDue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CalendarEntry {
    pub kind: CalendarEntryKind,
    pub id: Uuid,
    pub title: String,
    #[ts(type = "string")]
    pub start: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub end: Option<DateTime<Utc>>,
    pub initiative_id: Uuid,
    pub url: String,
}

/// Events plus task due dates inside `range`, in chronological order. `events`
/// are expected to be range-filtered already; tasks are filtered here.
pub fn calendar(events: Vec<Event>, tasks: &[Task], range: &DateRange) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = events
        .into_iter()
        .map(|e| CalendarEntry {
            kind: CalendarEntryKind::Event,
            url: format!("/initiatives/{}", e.initiative_id),
            id: e.id,
            title: e.title,
            start: e.start_at,
            end: e.end_at,
            initiative_id: e.initiative_id,
        })
        .chain(tasks.iter().filter(|t| range.contains(t.due_date)).map(|t| CalendarEntry {
            kind: CalendarEntryKind::TaskDue,
            id: t.id,
            title: t.title.clone(),
            start: t.due_date,
            end: None,
            initiative_id: t.initiative_id,
            url: format!("/tasks/{}", t.id),
        }))
        .collect();
    entries.sort_by(|a, b| a.start.cmp(&b.start));
    entries
}

// --- Overview ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub recent_tasks: Vec<Task>,
    pub recent_notes: Vec<Note>,
    pub districts: Vec<District>,
    pub coordinators: Vec<User>,
}

// --- CSV Export ---

/// ExportKind
///
/// Which collection `GET /reports/export` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    #[default]
    Initiatives,
    Tasks,
}

impl ExportKind {
    pub fn filename(self) -> &'static str {
        match self {
            ExportKind::Initiatives => "initiatives.csv",
            ExportKind::Tasks => "tasks.csv",
        }
    }
}

impl FromStr for ExportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiatives" => Ok(ExportKind::Initiatives),
            "tasks" => Ok(ExportKind::Tasks),
            other => Err(AppError::invalid(format!("unknown export type: {other}"))),
        }
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| AppError::Export(csv::Error::from(e.into_error())))
}

pub fn initiatives_csv(initiatives: &[Initiative]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Title", "District", "Coordinator", "Type", "Status", "Start Date", "End Date"])?;
    for i in initiatives {
        let start = i.start_date.to_string();
        let end = i.end_date.map(|d| d.to_string()).unwrap_or_default();
        writer.write_record([
            i.title.as_str(),
            i.district_name.as_str(),
            i.coordinator_name.as_str(),
            i.initiative_type.label(),
            i.status.label(),
            start.as_str(),
            end.as_str(),
        ])?;
    }
    finish(writer)
}

pub fn tasks_csv(tasks: &[Task], now: DateTime<Utc>) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Title",
        "Initiative",
        "District",
        "Assigned To",
        "Priority",
        "Status",
        "Due Date",
        "Progress (%)",
        "Overdue",
    ])?;
    for t in tasks {
        let due = t.due_date.format("%Y-%m-%d %H:%M").to_string();
        let progress = t.progress.to_string();
        writer.write_record([
            t.title.as_str(),
            t.initiative_title.as_str(),
            t.district_name.as_str(),
            t.assignee_name.as_str(),
            t.priority.label(),
            t.status.label(),
            due.as_str(),
            progress.as_str(),
            if t.is_overdue(now) { "Yes" } else { "No" },
        ])?;
    }
    finish(writer)
}

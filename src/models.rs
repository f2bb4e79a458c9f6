use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    choices::{
        InitiativeStatus, InitiativeType, NoteType, Role, TaskPriority, TaskStatus, empty_as_none,
    },
    error::{AppError, AppResult},
};

// --- Core Entities (Mapped to Database) ---

/// District
///
/// The unit of visibility. Every scoped record belongs to exactly one district
/// through its initiative.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct District {
    pub id: Uuid,
    // Unique across the table.
    pub name: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// User
///
/// The local profile row mirrored from the external identity provider.
/// `district_id` is the actor's home district; it is ignored for admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary key, shared with the identity provider's user id.
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub district_id: Option<Uuid>,
    // Loaded via a JOIN on districts.
    #[sqlx(default)]
    pub district_name: Option<String>,
    pub phone: String,
    pub bio: String,
    // Object key of the uploaded avatar.
    pub profile_picture: Option<String>,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Initiative
///
/// A district-level programme run by one coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Initiative {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub initiative_type: InitiativeType,
    pub status: InitiativeStatus,
    pub district_id: Uuid,
    #[sqlx(default)]
    pub district_name: String,
    // Owner for mutation authorization.
    pub coordinator_id: Uuid,
    #[sqlx(default)]
    pub coordinator_name: String,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub kpi_target: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Task
///
/// A unit of work inside an initiative. `district_id` is resolved through the
/// initiative; `is_overdue` is derived at read time and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub initiative_id: Uuid,
    #[sqlx(default)]
    pub initiative_title: String,
    pub district_id: Uuid,
    #[sqlx(default)]
    pub district_name: String,
    // Owner for mutation authorization.
    pub assigned_to: Uuid,
    #[sqlx(default)]
    pub assignee_name: String,
    pub created_by: Uuid,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[ts(type = "string")]
    pub due_date: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub completed_at: Option<DateTime<Utc>>,
    // Bounded to [0, 100].
    pub progress: i32,
    #[sqlx(default)]
    pub is_overdue: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Past its due date and not completed. Any status other than `Completed` counts,
    /// including `OnHold`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != TaskStatus::Completed
    }

    /// apply_status
    ///
    /// There is no transition graph: any status may follow any other. Entering
    /// `Completed` stamps `completed_at` with `now` on every call, even when the task
    /// was already completed. Leaving `Completed` keeps the previous stamp.
    pub fn apply_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        if status == TaskStatus::Completed {
            self.completed_at = Some(now);
        }
        self.is_overdue = self.is_overdue(now);
    }

    pub fn set_progress(&mut self, progress: i32) -> AppResult<()> {
        check_progress(progress)?;
        self.progress = progress;
        Ok(())
    }
}

/// Note
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub note_type: NoteType,
    pub initiative_id: Uuid,
    #[sqlx(default)]
    pub initiative_title: String,
    pub task_id: Option<Uuid>,
    pub district_id: Uuid,
    #[sqlx(default)]
    pub district_name: String,
    // Owner for mutation authorization.
    pub author_id: Uuid,
    #[sqlx(default)]
    pub author_name: String,
    pub is_public: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Document
///
/// Metadata for an uploaded file. `file_size` mirrors the stored object's size
/// at the moment the record was saved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    // Object storage key (e.g. "documents/<uuid>.pdf").
    pub file_key: String,
    #[ts(type = "number")]
    pub file_size: i64,
    pub initiative_id: Uuid,
    #[sqlx(default)]
    pub initiative_title: String,
    pub task_id: Option<Uuid>,
    pub district_id: Uuid,
    #[sqlx(default)]
    pub district_name: String,
    // Owner for mutation authorization.
    pub uploaded_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// InitiativeSheet
///
/// A linked external spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct InitiativeSheet {
    pub id: Uuid,
    pub initiative_id: Uuid,
    pub district_id: Uuid,
    pub sheet_url: String,
    pub added_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Event
///
/// A scheduled meeting or session attached to an initiative.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Event {
    pub id: Uuid,
    pub initiative_id: Uuid,
    #[sqlx(default)]
    pub initiative_title: String,
    pub district_id: Uuid,
    pub title: String,
    pub description: String,
    #[ts(type = "string")]
    pub start_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub end_at: Option<DateTime<Utc>>,
    pub meet_link: Option<String>,
    pub location: String,
    pub created_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateDistrictRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CreateDistrictRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_name(&self.name, 100)
    }
}

/// Partial update: only `Some` fields are applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateDistrictRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateDistrictRequest {
    pub fn apply(self, district: &mut District) -> AppResult<()> {
        if let Some(name) = self.name {
            check_name(&name, 100)?;
            district.name = name;
        }
        if let Some(description) = self.description {
            district.description = description;
        }
        Ok(())
    }
}

/// CreateInitiativeRequest
///
/// The coordinator is never taken from the payload: it is the acting user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateInitiativeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub initiative_type: InitiativeType,
    #[serde(default)]
    pub status: InitiativeStatus,
    pub district_id: Uuid,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    #[serde(default)]
    pub kpi_target: String,
}

impl CreateInitiativeRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_name(&self.title, 200)?;
        check_date_range(self.start_date, self.end_date)?;
        check_budget(self.budget)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateInitiativeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative_type: Option<InitiativeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InitiativeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpi_target: Option<String>,
}

impl UpdateInitiativeRequest {
    /// Merges the provided fields into `initiative` and re-validates the result.
    /// District moves are authorized by the caller before this runs.
    pub fn apply(self, initiative: &mut Initiative) -> AppResult<()> {
        if let Some(title) = self.title {
            initiative.title = title;
        }
        if let Some(description) = self.description {
            initiative.description = description;
        }
        if let Some(kind) = self.initiative_type {
            initiative.initiative_type = kind;
        }
        if let Some(status) = self.status {
            initiative.status = status;
        }
        if let Some(district_id) = self.district_id {
            initiative.district_id = district_id;
        }
        if let Some(start) = self.start_date {
            initiative.start_date = start;
        }
        if self.end_date.is_some() {
            initiative.end_date = self.end_date;
        }
        if self.budget.is_some() {
            initiative.budget = self.budget;
        }
        if let Some(kpi) = self.kpi_target {
            initiative.kpi_target = kpi;
        }
        check_name(&initiative.title, 200)?;
        check_date_range(initiative.start_date, initiative.end_date)?;
        check_budget(initiative.budget)
    }
}

/// CreateTaskRequest
///
/// `created_by` comes from the session; `assigned_to` must name a coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub initiative_id: Uuid,
    pub assigned_to: Uuid,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    #[ts(type = "string")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub progress: i32,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_name(&self.title, 200)?;
        check_progress(self.progress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
}

impl UpdateTaskRequest {
    /// Merges the provided fields into `task`. A status change goes through
    /// `Task::apply_status` so completion is stamped the same way as the quick
    /// status endpoint. Re-parenting and re-assignment are authorized by the caller.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) -> AppResult<()> {
        if let Some(progress) = self.progress {
            task.set_progress(progress)?;
        }
        if let Some(title) = self.title {
            check_name(&title, 200)?;
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(initiative_id) = self.initiative_id {
            task.initiative_id = initiative_id;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.apply_status(status, now);
        }
        task.is_overdue = task.is_overdue(now);
        Ok(())
    }
}

/// TaskStatusForm
///
/// Form-encoded body of the quick status endpoint. Fields are kept as raw strings so
/// that unparseable values become a `{"success": false}` answer instead of a
/// rejection from the extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct TaskStatusForm {
    pub status: String,
    pub progress: Option<String>,
}

impl TaskStatusForm {
    /// Parses the form into a typed status and progress. Missing progress means 0.
    pub fn parse(&self) -> Option<(TaskStatus, i32)> {
        let status = self.status.trim().parse::<TaskStatus>().ok()?;
        let progress = match self.progress.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw.parse::<i32>().ok()?,
        };
        check_progress(progress).ok()?;
        Some((status, progress))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct StatusUpdateResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub note_type: NoteType,
    pub initiative_id: Uuid,
    pub task_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

impl CreateNoteRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_name(&self.title, 200)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateNoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl UpdateNoteRequest {
    pub fn apply(self, note: &mut Note) -> AppResult<()> {
        if let Some(title) = self.title {
            check_name(&title, 200)?;
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(note_type) = self.note_type {
            note.note_type = note_type;
        }
        if let Some(is_public) = self.is_public {
            note.is_public = is_public;
        }
        Ok(())
    }
}

/// CreateDocumentRequest
///
/// Submitted after the client finished the presigned upload. The size is read
/// back from storage, never trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub file_key: String,
    pub initiative_id: Uuid,
    pub task_id: Option<Uuid>,
}

impl CreateDocumentRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_name(&self.title, 200)?;
        if self.file_key.trim().is_empty() {
            return Err(AppError::invalid("an uploaded file is required"));
        }
        Ok(())
    }
}

/// A validated document ready to persist.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub description: String,
    pub file_key: String,
    pub file_size: i64,
    pub initiative_id: Uuid,
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateSheetRequest {
    pub sheet_url: String,
}

impl CreateSheetRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_url(&self.sheet_url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[ts(type = "string")]
    pub start_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub end_at: Option<DateTime<Utc>>,
    pub meet_link: Option<String>,
    #[serde(default)]
    pub location: String,
}

impl CreateEventRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_name(&self.title, 200)?;
        if let Some(end) = self.end_at {
            if end < self.start_at {
                return Err(AppError::invalid("event cannot end before it starts"));
            }
        }
        match &self.meet_link {
            Some(link) => check_url(link),
            None => Ok(()),
        }
    }
}

/// CreateUserRequest
///
/// The password is forwarded to the identity provider and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    pub district_id: Option<Uuid>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        if !self.email.contains('@') {
            return Err(AppError::invalid("email address is not valid"));
        }
        if self.password.len() < 8 {
            return Err(AppError::invalid("password must be at least 8 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn apply(self, user: &mut User) {
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if self.district_id.is_some() {
            user.district_id = self.district_id;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if self.profile_picture_key.is_some() {
            user.profile_picture = self.profile_picture_key;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}

/// UploadPurpose
///
/// Selects which extension allow-list applies to an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UploadPurpose {
    #[default]
    Document,
    ProfilePicture,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL (POST /upload/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive and check the file extension.
    #[schema(example = "workshop_report.pdf")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "application/pdf")]
    pub file_type: String,
    #[serde(default)]
    pub purpose: UploadPurpose,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to reference in the follow-up create request.
    pub resource_key: String,
}

// --- List Filters (Query Parameters) ---

/// Filters conjoined after the mandatory visibility scope.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InitiativeFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<InitiativeStatus>,
    #[serde(default, rename = "type", deserialize_with = "empty_as_none")]
    pub initiative_type: Option<InitiativeType>,
    /// District name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
}

impl InitiativeFilter {
    pub fn matches(&self, initiative: &Initiative) -> bool {
        self.status.is_none_or(|s| initiative.status == s)
            && self.initiative_type.is_none_or(|t| initiative.initiative_type == t)
            && self.district.as_deref().is_none_or(|d| initiative.district_name == d)
            && self
                .search
                .as_deref()
                .is_none_or(|q| contains_ci(&initiative.title, q) || contains_ci(&initiative.description, q))
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub priority: Option<TaskPriority>,
    /// District name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub initiative_id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub assigned_to: Option<Uuid>,
}

impl TaskFilter {
    pub fn for_initiative(initiative_id: Uuid) -> Self {
        TaskFilter {
            initiative_id: Some(initiative_id),
            ..TaskFilter::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.priority.is_none_or(|p| task.priority == p)
            && self.district.as_deref().is_none_or(|d| task.district_name == d)
            && self.initiative_id.is_none_or(|id| task.initiative_id == id)
            && self.assigned_to.is_none_or(|id| task.assigned_to == id)
            && self
                .search
                .as_deref()
                .is_none_or(|q| contains_ci(&task.title, q) || contains_ci(&task.description, q))
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NoteFilter {
    #[serde(default, rename = "type", deserialize_with = "empty_as_none")]
    pub note_type: Option<NoteType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub initiative_id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub task_id: Option<Uuid>,
}

impl NoteFilter {
    pub fn for_initiative(initiative_id: Uuid) -> Self {
        NoteFilter {
            initiative_id: Some(initiative_id),
            ..NoteFilter::default()
        }
    }

    pub fn for_task(task_id: Uuid) -> Self {
        NoteFilter {
            task_id: Some(task_id),
            ..NoteFilter::default()
        }
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.note_type.is_none_or(|t| note.note_type == t)
            && self.district.as_deref().is_none_or(|d| note.district_name == d)
            && self.initiative_id.is_none_or(|id| note.initiative_id == id)
            && self.task_id.is_none_or(|id| note.task_id == Some(id))
            && self
                .search
                .as_deref()
                .is_none_or(|q| contains_ci(&note.title, q) || contains_ci(&note.content, q))
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub initiative_id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub task_id: Option<Uuid>,
}

impl DocumentFilter {
    pub fn for_initiative(initiative_id: Uuid) -> Self {
        DocumentFilter {
            initiative_id: Some(initiative_id),
            ..DocumentFilter::default()
        }
    }

    pub fn for_task(task_id: Uuid) -> Self {
        DocumentFilter {
            task_id: Some(task_id),
            ..DocumentFilter::default()
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.district.as_deref().is_none_or(|d| document.district_name == d)
            && self.initiative_id.is_none_or(|id| document.initiative_id == id)
            && self.task_id.is_none_or(|id| document.task_id == Some(id))
            && self
                .search
                .as_deref()
                .is_none_or(|q| contains_ci(&document.title, q) || contains_ci(&document.description, q))
    }
}

/// Optional inclusive window over event start times.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }
}

// --- Composite Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DistrictDetail {
    pub district: District,
    pub initiatives: Vec<Initiative>,
    pub coordinators: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct InitiativeDetail {
    pub initiative: Initiative,
    pub average_progress: f64,
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub documents: Vec<Document>,
    pub sheets: Vec<InitiativeSheet>,
    pub events: Vec<Event>,
    pub can_edit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TaskDetail {
    pub task: Task,
    pub notes: Vec<Note>,
    pub documents: Vec<Document>,
    pub can_edit: bool,
}

// --- Validation Helpers ---

fn default_true() -> bool {
    true
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn check_name(value: &str, max: usize) -> AppResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid("this field is required"));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::invalid(format!(
            "must be at most {max} characters"
        )));
    }
    Ok(())
}

pub(crate) fn check_progress(progress: i32) -> AppResult<()> {
    if !(0..=100).contains(&progress) {
        return Err(AppError::invalid("progress must be between 0 and 100"));
    }
    Ok(())
}

fn check_date_range(start: NaiveDate, end: Option<NaiveDate>) -> AppResult<()> {
    match end {
        Some(end) if end < start => Err(AppError::invalid("end date is before start date")),
        _ => Ok(()),
    }
}

fn check_budget(budget: Option<f64>) -> AppResult<()> {
    match budget {
        Some(b) if !b.is_finite() || b < 0.0 => Err(AppError::invalid("budget must be a non-negative amount")),
        _ => Ok(()),
    }
}

fn check_url(url: &str) -> AppResult<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(AppError::invalid("link must be an http(s) URL"))
    }
}

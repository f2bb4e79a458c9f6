use axum::{
    Form, Json,
    extract::{Path, Query, State, rejection::FormRejection},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::{assignee, audit, parent_initiative, require_author};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        CreateTaskRequest, DocumentFilter, NoteFilter, StatusUpdateResponse, Task, TaskDetail, TaskFilter,
        TaskStatusForm, UpdateTaskRequest,
    },
    policy::{Actor, EntityKind, authorize_modify, can_modify, scope},
};

/// list_tasks
///
/// Scoped list, latest due date first, then highest priority.
#[utoipa::path(
    get,
    path = "/tasks",
    params(TaskFilter),
    responses((status = 200, description = "Visible tasks", body = [Task]))
)]
pub async fn list_tasks(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<Vec<Task>>> {
    Ok(Json(state.repo.list_tasks(&scope(&actor), &filter).await?))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task with its notes and documents", body = TaskDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_task(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TaskDetail>> {
    let visible = scope(&actor);
    let task = state.repo.get_task(&visible, id).await?.ok_or(AppError::NotFound)?;
    let notes = state.repo.list_notes(&visible, &NoteFilter::for_task(id)).await?;
    let documents = state.repo.list_documents(&visible, &DocumentFilter::for_task(id)).await?;

    Ok(Json(TaskDetail {
        can_edit: can_modify(&actor, &task),
        task,
        notes,
        documents,
    }))
}

/// create_task
///
/// The parent initiative must be visible to the actor and the assignee must be
/// an active coordinator the actor may assign to.
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Created", body = Task),
        (status = 403, description = "Assignee not allowed"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_task(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    require_author(&actor, EntityKind::Task)?;
    payload.validate()?;
    parent_initiative(&state.repo, &actor, payload.initiative_id).await?;
    assignee(&state.repo, &actor, payload.assigned_to).await?;

    let task = state.repo.create_task(payload, actor.id).await?;
    audit(&actor, "create", EntityKind::Task, task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// update_task
///
/// [Owner or Admin] Partial update. Moving the task or reassigning it repeats the
/// checks made at creation.
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated", body = Task),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_task(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> AppResult<Json<Task>> {
    let mut task = state.repo.get_task(&scope(&actor), id).await?.ok_or(AppError::NotFound)?;
    authorize_modify(&actor, &task, "edit")?;

    if let Some(initiative_id) = payload.initiative_id.filter(|i| *i != task.initiative_id) {
        parent_initiative(&state.repo, &actor, initiative_id).await?;
    }
    if let Some(assigned_to) = payload.assigned_to.filter(|a| *a != task.assigned_to) {
        assignee(&state.repo, &actor, assigned_to).await?;
    }

    payload.apply(&mut task, Utc::now())?;
    let saved = state.repo.save_task(&task).await?;
    audit(&actor, "edit", EntityKind::Task, id);
    Ok(Json(saved))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_task(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let task = state.repo.get_task(&scope(&actor), id).await?.ok_or(AppError::NotFound)?;
    authorize_modify(&actor, &task, "delete")?;

    if !state.repo.delete_task(id).await? {
        return Err(AppError::NotFound);
    }
    audit(&actor, "delete", EntityKind::Task, id);
    Ok(StatusCode::NO_CONTENT)
}

/// update_task_status
///
/// Form-encoded quick update of `status` and `progress`. Never fails: anything
/// that prevents the write (bad input, invisible task, not the owner, storage
/// error) is answered with `{"success": false}`.
#[utoipa::path(
    post,
    path = "/tasks/{id}/update-status",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body(content = TaskStatusForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 200, description = "Whether the update was applied", body = StatusUpdateResponse))
)]
pub async fn update_task_status(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: Result<Form<TaskStatusForm>, FormRejection>,
) -> Json<StatusUpdateResponse> {
    let success = match apply_status_form(&state, &actor, id, form).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(task_id = %id, error = %e, "status update not applied");
            false
        }
    };
    Json(StatusUpdateResponse { success })
}

async fn apply_status_form(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
    form: Result<Form<TaskStatusForm>, FormRejection>,
) -> AppResult<()> {
    let Form(form) = form.map_err(|e| AppError::invalid(e.body_text()))?;
    let (status, progress) = form
        .parse()
        .ok_or_else(|| AppError::invalid("unknown status or progress out of range"))?;

    let mut task = state.repo.get_task(&scope(actor), id).await?.ok_or(AppError::NotFound)?;
    authorize_modify(actor, &task, "update")?;

    task.apply_status(status, Utc::now());
    task.set_progress(progress)?;
    state.repo.save_task(&task).await?;
    audit(actor, "update status", EntityKind::Task, id);
    Ok(())
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{audit, parent_initiative, parent_task, require_author};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{CreateNoteRequest, Note, NoteFilter, UpdateNoteRequest},
    policy::{EntityKind, authorize_modify, scope},
};

#[utoipa::path(
    get,
    path = "/notes",
    params(NoteFilter),
    responses((status = 200, description = "Visible notes, newest first", body = [Note]))
)]
pub async fn list_notes(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<NoteFilter>,
) -> AppResult<Json<Vec<Note>>> {
    Ok(Json(state.repo.list_notes(&scope(&actor), &filter).await?))
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note", body = Note),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_note(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Note>> {
    let note = state.repo.get_note(&scope(&actor), id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(note))
}

/// create_note
///
/// Attached to a visible initiative and, optionally, one of its tasks.
#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Created", body = Note),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_note(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateNoteRequest>,
) -> AppResult<(StatusCode, Json<Note>)> {
    require_author(&actor, EntityKind::Note)?;
    payload.validate()?;
    parent_initiative(&state.repo, &actor, payload.initiative_id).await?;
    if let Some(task_id) = payload.task_id {
        parent_task(&state.repo, &actor, task_id, payload.initiative_id).await?;
    }

    let note = state.repo.create_note(payload, actor.id).await?;
    audit(&actor, "create", EntityKind::Note, note.id);
    Ok((StatusCode::CREATED, Json(note)))
}

/// update_note
///
/// [Author or Admin]
#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated", body = Note),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_note(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> AppResult<Json<Note>> {
    let mut note = state.repo.get_note(&scope(&actor), id).await?.ok_or(AppError::NotFound)?;
    authorize_modify(&actor, &note, "edit")?;

    payload.apply(&mut note)?;
    let saved = state.repo.save_note(&note).await?;
    audit(&actor, "edit", EntityKind::Note, id);
    Ok(Json(saved))
}

/// delete_note
///
/// [Author or Admin]
#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_note(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let note = state.repo.get_note(&scope(&actor), id).await?.ok_or(AppError::NotFound)?;
    authorize_modify(&actor, &note, "delete")?;

    if !state.repo.delete_note(id).await? {
        return Err(AppError::NotFound);
    }
    audit(&actor, "delete", EntityKind::Note, id);
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{audit, require_author};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        CreateEventRequest, CreateInitiativeRequest, CreateSheetRequest, DateRange, DocumentFilter, Event,
        Initiative, InitiativeDetail, InitiativeFilter, InitiativeSheet, NoteFilter, TaskFilter,
        UpdateInitiativeRequest,
    },
    policy::{self, EntityKind, authorize, authorize_modify, can_modify, scope},
    reports::average_progress,
};

/// list_initiatives
///
/// Scoped list with optional `status`, `type`, `district` (name) and `search` filters,
/// newest first.
#[utoipa::path(
    get,
    path = "/initiatives",
    params(InitiativeFilter),
    responses((status = 200, description = "Visible initiatives", body = [Initiative]))
)]
pub async fn list_initiatives(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<InitiativeFilter>,
) -> AppResult<Json<Vec<Initiative>>> {
    Ok(Json(state.repo.list_initiatives(&scope(&actor), &filter).await?))
}

/// get_initiative
///
/// Detail view: the initiative with its tasks, notes, documents, sheets and events,
/// average task progress, and whether the caller may edit it.
#[utoipa::path(
    get,
    path = "/initiatives/{id}",
    params(("id" = Uuid, Path, description = "Initiative ID")),
    responses(
        (status = 200, description = "Initiative detail", body = InitiativeDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_initiative(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InitiativeDetail>> {
    let visible = scope(&actor);
    let initiative = state.repo.get_initiative(&visible, id).await?.ok_or(AppError::NotFound)?;

    let tasks = state.repo.list_tasks(&visible, &TaskFilter::for_initiative(id)).await?;
    let notes = state.repo.list_notes(&visible, &NoteFilter::for_initiative(id)).await?;
    let documents = state.repo.list_documents(&visible, &DocumentFilter::for_initiative(id)).await?;
    let sheets = state.repo.list_sheets(&visible, id).await?;
    let events = state.repo.list_events(&visible, &DateRange::default(), Some(id)).await?;

    Ok(Json(InitiativeDetail {
        average_progress: average_progress(&tasks),
        can_edit: can_modify(&actor, &initiative),
        initiative,
        tasks,
        notes,
        documents,
        sheets,
        events,
    }))
}

/// create_initiative
///
/// The acting user becomes the coordinator. Non-admins may only create in their
/// own district.
#[utoipa::path(
    post,
    path = "/initiatives",
    request_body = CreateInitiativeRequest,
    responses(
        (status = 201, description = "Created", body = Initiative),
        (status = 403, description = "Not allowed in this district"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_initiative(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateInitiativeRequest>,
) -> AppResult<(StatusCode, Json<Initiative>)> {
    require_author(&actor, EntityKind::Initiative)?;
    authorize(
        &actor,
        policy::can_place_in_district(&actor, payload.district_id),
        "create",
        EntityKind::Initiative,
        None,
    )?;
    payload.validate()?;

    let initiative = state.repo.create_initiative(payload, actor.id).await?;
    audit(&actor, "create", EntityKind::Initiative, initiative.id);
    Ok((StatusCode::CREATED, Json(initiative)))
}

/// update_initiative
///
/// [Owner or Admin] Partial update. Moving to another district is subject to the
/// same placement rule as creation.
#[utoipa::path(
    put,
    path = "/initiatives/{id}",
    params(("id" = Uuid, Path, description = "Initiative ID")),
    request_body = UpdateInitiativeRequest,
    responses(
        (status = 200, description = "Updated", body = Initiative),
        (status = 403, description = "Not the coordinator"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_initiative(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInitiativeRequest>,
) -> AppResult<Json<Initiative>> {
    let mut initiative = state
        .repo
        .get_initiative(&scope(&actor), id)
        .await?
        .ok_or(AppError::NotFound)?;
    authorize_modify(&actor, &initiative, "edit")?;
    if let Some(district_id) = payload.district_id {
        authorize(
            &actor,
            policy::can_place_in_district(&actor, district_id),
            "move",
            EntityKind::Initiative,
            Some(id),
        )?;
    }

    payload.apply(&mut initiative)?;
    let saved = state.repo.save_initiative(&initiative).await?;
    audit(&actor, "edit", EntityKind::Initiative, id);
    Ok(Json(saved))
}

/// delete_initiative
///
/// [Owner or Admin] Cascades to tasks, notes, documents, sheets and events.
#[utoipa::path(
    delete,
    path = "/initiatives/{id}",
    params(("id" = Uuid, Path, description = "Initiative ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the coordinator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_initiative(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let initiative = state
        .repo
        .get_initiative(&scope(&actor), id)
        .await?
        .ok_or(AppError::NotFound)?;
    authorize_modify(&actor, &initiative, "delete")?;

    if !state.repo.delete_initiative(id).await? {
        return Err(AppError::NotFound);
    }
    audit(&actor, "delete", EntityKind::Initiative, id);
    Ok(StatusCode::NO_CONTENT)
}

/// add_sheet
///
/// [Owner or Admin] Links an external spreadsheet to the initiative.
#[utoipa::path(
    post,
    path = "/initiatives/{id}/sheets",
    params(("id" = Uuid, Path, description = "Initiative ID")),
    request_body = CreateSheetRequest,
    responses(
        (status = 201, description = "Linked", body = InitiativeSheet),
        (status = 403, description = "Not the coordinator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn add_sheet(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSheetRequest>,
) -> AppResult<(StatusCode, Json<InitiativeSheet>)> {
    let initiative = state
        .repo
        .get_initiative(&scope(&actor), id)
        .await?
        .ok_or(AppError::NotFound)?;
    authorize(&actor, can_modify(&actor, &initiative), "add a sheet to", EntityKind::Initiative, Some(id))?;
    payload.validate()?;

    let sheet = state.repo.create_sheet(id, payload, actor.id).await?;
    audit(&actor, "create", EntityKind::Sheet, sheet.id);
    Ok((StatusCode::CREATED, Json(sheet)))
}

/// add_event
///
/// [Owner or Admin] Schedules an event under the initiative.
#[utoipa::path(
    post,
    path = "/initiatives/{id}/events",
    params(("id" = Uuid, Path, description = "Initiative ID")),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Scheduled", body = Event),
        (status = 403, description = "Not the coordinator"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn add_event(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let initiative = state
        .repo
        .get_initiative(&scope(&actor), id)
        .await?
        .ok_or(AppError::NotFound)?;
    authorize(&actor, can_modify(&actor, &initiative), "add an event to", EntityKind::Initiative, Some(id))?;
    payload.validate()?;

    let event = state.repo.create_event(id, payload, actor.id).await?;
    audit(&actor, "create", EntityKind::Event, event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{audit, require_admin};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{CreateDistrictRequest, District, DistrictDetail, InitiativeFilter, UpdateDistrictRequest},
    policy::{EntityKind, Scope, scope},
};

/// list_districts
///
/// Admins see every district; everyone else sees only their own.
#[utoipa::path(
    get,
    path = "/districts",
    responses((status = 200, description = "Visible districts", body = [District]))
)]
pub async fn list_districts(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<District>>> {
    Ok(Json(state.repo.list_districts(&scope(&actor)).await?))
}

/// get_district
///
/// The district with its initiatives and active coordinators.
#[utoipa::path(
    get,
    path = "/districts/{id}",
    params(("id" = Uuid, Path, description = "District ID")),
    responses(
        (status = 200, description = "District detail", body = DistrictDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_district(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DistrictDetail>> {
    let visible = scope(&actor);
    let district = state.repo.get_district(&visible, id).await?.ok_or(AppError::NotFound)?;

    let initiatives = state
        .repo
        .list_initiatives(&visible, &InitiativeFilter::default())
        .await?
        .into_iter()
        .filter(|i| i.district_id == district.id)
        .collect();
    let coordinators = state.repo.list_coordinators(&Scope::District(district.id)).await?;

    Ok(Json(DistrictDetail {
        district,
        initiatives,
        coordinators,
    }))
}

/// create_district
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/admin/districts",
    request_body = CreateDistrictRequest,
    responses(
        (status = 201, description = "Created", body = District),
        (status = 403, description = "Admins only"),
        (status = 422, description = "Invalid or duplicate name")
    )
)]
pub async fn create_district(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateDistrictRequest>,
) -> AppResult<(StatusCode, Json<District>)> {
    require_admin(&actor, "create", EntityKind::District, None)?;
    payload.validate()?;
    let district = state.repo.create_district(payload).await?;
    audit(&actor, "create", EntityKind::District, district.id);
    Ok((StatusCode::CREATED, Json(district)))
}

/// update_district
///
/// [Admin Route] Partial update.
#[utoipa::path(
    put,
    path = "/admin/districts/{id}",
    params(("id" = Uuid, Path, description = "District ID")),
    request_body = UpdateDistrictRequest,
    responses(
        (status = 200, description = "Updated", body = District),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_district(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDistrictRequest>,
) -> AppResult<Json<District>> {
    require_admin(&actor, "edit", EntityKind::District, Some(id))?;
    let mut district = state
        .repo
        .get_district(&Scope::Unrestricted, id)
        .await?
        .ok_or(AppError::NotFound)?;
    payload.apply(&mut district)?;
    let saved = state.repo.save_district(&district).await?;
    audit(&actor, "edit", EntityKind::District, id);
    Ok(Json(saved))
}

/// delete_district
///
/// [Admin Route] Cascades to the district's initiatives and everything under them;
/// members keep their accounts with no home district.
#[utoipa::path(
    delete,
    path = "/admin/districts/{id}",
    params(("id" = Uuid, Path, description = "District ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_district(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&actor, "delete", EntityKind::District, Some(id))?;
    if !state.repo.delete_district(id).await? {
        return Err(AppError::NotFound);
    }
    audit(&actor, "delete", EntityKind::District, id);
    Ok(StatusCode::NO_CONTENT)
}

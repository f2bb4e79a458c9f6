use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::{audit, require_admin};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{CreateUserRequest, UpdateUserRequest, UploadPurpose, User},
    policy::{self, EntityKind},
    storage::sanitize_key,
};

/// get_me
///
/// The caller's own profile, including the district name.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<User>> {
    let user = state.repo.get_user(actor.id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// list_users
///
/// [Admin Route]
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 403, description = "Admins only")
    )
)]
pub async fn list_users(AuthUser(actor): AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    require_admin(&actor, "list", EntityKind::User, None)?;
    Ok(Json(state.repo.list_users().await?))
}

/// get_user
///
/// [Admin Route]
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    require_admin(&actor, "view", EntityKind::User, Some(id))?;
    let user = state.repo.get_user(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// create_user
///
/// [Admin Route] Registers the account with the identity provider first, then
/// stores the local profile under the id the provider issued.
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 403, description = "Admins only"),
        (status = 422, description = "Invalid input or rejected by the identity provider")
    )
)]
pub async fn create_user(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    require_admin(&actor, "create", EntityKind::User, None)?;
    payload.validate()?;

    let id = state.identity.sign_up(&payload.email, &payload.password).await?;
    let now = Utc::now();
    let user = state
        .repo
        .create_user(User {
            id,
            email: payload.email,
            full_name: payload.full_name,
            role: payload.role,
            district_id: payload.district_id,
            is_active: true,
            created_at: now,
            updated_at: now,
            ..User::default()
        })
        .await?;

    audit(&actor, "create", EntityKind::User, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// update_user
///
/// [Admin Route] Partial profile update. A new profile picture must be a key issued
/// for profile pictures.
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_user(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    require_admin(&actor, "edit", EntityKind::User, Some(id))?;
    let mut user = state.repo.get_user(id).await?.ok_or(AppError::NotFound)?;

    if let Some(key) = payload.profile_picture_key.take() {
        let key = sanitize_key(&key);
        if !key.starts_with(UploadPurpose::ProfilePicture.key_prefix()) {
            return Err(AppError::invalid("the file was not uploaded as a profile picture"));
        }
        payload.profile_picture_key = Some(key);
    }

    payload.apply(&mut user);
    let saved = state.repo.save_user(&user).await?;
    audit(&actor, "edit", EntityKind::User, id);
    Ok(Json(saved))
}

/// delete_user
///
/// [Admin Route] An admin can delete any account except their own.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    policy::authorize(&actor, policy::can_delete_user(&actor, id), "delete", EntityKind::User, Some(id))?;
    if !state.repo.delete_user(id).await? {
        return Err(AppError::NotFound);
    }
    audit(&actor, "delete", EntityKind::User, id);
    Ok(StatusCode::NO_CONTENT)
}

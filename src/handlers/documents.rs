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
    models::{
        CreateDocumentRequest, Document, DocumentFilter, NewDocument, PresignedUrlRequest, PresignedUrlResponse,
        UploadPurpose,
    },
    policy::{EntityKind, authorize_modify, scope},
    storage::{allowed_extension, sanitize_key},
};

/// get_presigned_url
///
/// Issues a short-lived PUT URL for a direct client-to-storage upload. The object
/// key is generated here (`<prefix><uuid>.<ext>`); only allow-listed extensions
/// for the requested purpose are accepted.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 422, description = "File type not allowed")
    )
)]
pub async fn get_presigned_url(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> AppResult<Json<PresignedUrlResponse>> {
    if payload.purpose == UploadPurpose::Document {
        require_author(&actor, EntityKind::Document)?;
    }
    let extension = allowed_extension(&payload.filename, payload.purpose)
        .ok_or_else(|| AppError::invalid("this file type is not allowed"))?;
    let object_key = format!("{}{}.{}", payload.purpose.key_prefix(), Uuid::new_v4(), extension);

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(AppError::Storage)?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}

#[utoipa::path(
    get,
    path = "/documents",
    params(DocumentFilter),
    responses((status = 200, description = "Visible documents, newest first", body = [Document]))
)]
pub async fn list_documents(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> AppResult<Json<Vec<Document>>> {
    Ok(Json(state.repo.list_documents(&scope(&actor), &filter).await?))
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_document(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Document>> {
    let document = state.repo.get_document(&scope(&actor), id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(document))
}

/// create_document
///
/// Records a file the client already uploaded through a presigned URL. The key
/// must be one issued for documents, and the size is read back from storage.
#[utoipa::path(
    post,
    path = "/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Created", body = Document),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_document(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateDocumentRequest>,
) -> AppResult<(StatusCode, Json<Document>)> {
    require_author(&actor, EntityKind::Document)?;
    payload.validate()?;

    let file_key = sanitize_key(&payload.file_key);
    if !file_key.starts_with(UploadPurpose::Document.key_prefix()) {
        return Err(AppError::invalid("the file was not uploaded as a document"));
    }
    parent_initiative(&state.repo, &actor, payload.initiative_id).await?;
    if let Some(task_id) = payload.task_id {
        parent_task(&state.repo, &actor, task_id, payload.initiative_id).await?;
    }

    let file_size = state.storage.object_size(&file_key).await.map_err(AppError::Storage)?;
    let new_document = NewDocument {
        title: payload.title,
        description: payload.description,
        file_key,
        file_size,
        initiative_id: payload.initiative_id,
        task_id: payload.task_id,
    };

    let document = state.repo.create_document(new_document, actor.id).await?;
    audit(&actor, "create", EntityKind::Document, document.id);
    Ok((StatusCode::CREATED, Json(document)))
}

/// delete_document
///
/// [Uploader or Admin] Removes the record. The stored object is left in place.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the uploader"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_document(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let document = state.repo.get_document(&scope(&actor), id).await?.ok_or(AppError::NotFound)?;
    authorize_modify(&actor, &document, "delete")?;

    if !state.repo.delete_document(id).await? {
        return Err(AppError::NotFound);
    }
    audit(&actor, "delete", EntityKind::Document, id);
    Ok(StatusCode::NO_CONTENT)
}

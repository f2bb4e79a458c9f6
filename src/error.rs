use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// AppError
///
/// The single failure taxonomy for request handling. Every variant is scoped to the
/// request that produced it; nothing here is fatal to the process.
///
/// - `NotFound` covers both "absent" and "outside the caller's scope" so that
///   scoped lookups never leak the existence of another district's records.
/// - `AccessDenied` is returned when the policy layer rejects a mutation, before any write.
/// - `Validation` rejects malformed input; no partial write happens.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("auth provider error: {0}")]
    AuthProvider(String),

    #[error("export error: {0}")]
    Export(#[from] csv::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn denied(message: impl Into<String>) -> Self {
        AppError::AccessDenied(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::AuthProvider(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Constraint violations are input problems, not infrastructure failures.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::invalid("a record with this value already exists");
            }
            if db_err.is_foreign_key_violation() {
                return AppError::invalid("a referenced record does not exist");
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound => "Not found".to_string(),
            AppError::AccessDenied(msg) | AppError::Validation(msg) => msg.clone(),
            other => {
                // Infrastructure details stay in the logs.
                tracing::error!(error = %other, "request failed");
                "Internal server error".to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;

use crate::validation::{self, FieldErrors};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("you do not have permission to perform this action")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(validation::field_error(field, message))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Maps a unique-constraint violation to a field error, passing other
    /// database errors through.
    pub fn on_unique(err: DbErr, field: &str, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::field(field, message),
            _ => Self::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(validation::flatten(&errors))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            },
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "detail": self.to_string() })))
                    .into_response()
            },
            AppError::Forbidden => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": self.to_string() }))).into_response()
            },
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": format!("{what} not found") })))
                    .into_response()
            },
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "database error");
                internal()
            },
            AppError::Internal(ref err) => {
                tracing::error!(error = ?err, "internal error");
                internal()
            },
        }
    }
}

fn internal() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "An internal server error occurred" })),
    )
        .into_response()
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::field("slug", "bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("title").into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_unique_db_errors_pass_through() {
        let err = AppError::on_unique(DbErr::Custom("nope".into()), "slug", "taken");
        assert!(matches!(err, AppError::Database(_)));
    }
}

use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;
use tracing::error;

use crate::models::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing")]
    Missing,

    #[error("Exists")]
    Exists,

    #[error("Invalid")]
    Invalid,

    #[error("Not found")]
    NotFound,

    #[error("Bad upload: {0}")]
    BadUpload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Internal server error")]
    InternalServerError,
}

impl AppError {
    /// Short reason string carried in the `error` field of the envelope.
    /// `None` means the envelope is a bare `{"ok": false}`.
    pub fn reason(&self) -> Option<String> {
        match self {
            AppError::Missing => Some("Missing".to_string()),
            AppError::Exists => Some("Exists".to_string()),
            AppError::Invalid => Some("Invalid".to_string()),
            AppError::NotFound => None,
            AppError::BadUpload(msg) => Some(msg.clone()),
            _ => Some("Internal server error".to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Missing | AppError::BadUpload(_) => StatusCode::BAD_REQUEST,
            AppError::Exists => StatusCode::CONFLICT,
            AppError::Invalid => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {}", self);
        }

        let body = Json(ApiResponse::<()>::failure(self.reason()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_short_reasons() {
        assert_eq!(AppError::Missing.reason().as_deref(), Some("Missing"));
        assert_eq!(AppError::Exists.reason().as_deref(), Some("Exists"));
        assert_eq!(AppError::Invalid.reason().as_deref(), Some("Invalid"));
        assert_eq!(AppError::NotFound.reason(), None);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::Config("PORT must be a number".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.reason().as_deref(), Some("Internal server error"));
    }
}

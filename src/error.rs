use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde_json::json;

use crate::store::StoreError;

/// Error type returned by every HTTP handler.
///
/// Rendered as `{ "error": <message>, "code": <CODE> }`, plus `details` for
/// validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request")]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Store(StoreError::NotFound { .. }) => "NOT_FOUND",
            AppError::Store(StoreError::Conflict(_)) => "CONFLICT",
            AppError::Store(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the client. Database and internal failures are not echoed.
    fn public_message(&self) -> String {
        match self {
            AppError::Store(StoreError::Database(_)) | AppError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = match self {
            AppError::Validation(details) => json!({
                "error": self.public_message(),
                "code": self.code(),
                "details": details,
            }),
            _ => json!({
                "error": self.public_message(),
                "code": self.code(),
            }),
        };

        HttpResponse::build(status).json(body)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token signing failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn validation_errors_carry_details() {
        let (status, body) =
            body_json(AppError::Validation(vec!["name must not be empty".into()])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"][0], "name must not be empty");
    }

    #[actix_web::test]
    async fn store_not_found_maps_to_404() {
        let (status, body) = body_json(AppError::Store(StoreError::NotFound {
            entity: "Task",
            id: 9,
        }))
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task with id 9 not found");
    }

    #[actix_web::test]
    async fn database_errors_are_not_echoed() {
        let (status, body) =
            body_json(AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }
}

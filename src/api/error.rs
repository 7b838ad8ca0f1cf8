use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::auth::AuthError;
use crate::db::StoreError;
use crate::models::ErrorResponse;

pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    /// Carries the server-side detail; clients only ever see
    /// [`INTERNAL_ERROR_MESSAGE`].
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{"error": message}` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => msg,
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        error_response(status, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("not found".to_string()),
            StoreError::Invalid(reason) => ApiError::BadRequest(reason.to_string()),
            StoreError::Connection(_) | StoreError::Query(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedHeader => {
                ApiError::Unauthorized("missing or invalid token".to_string())
            }
            AuthError::Unauthenticated(_) => ApiError::Unauthorized("invalid token".to_string()),
            AuthError::SigningKeyNotConfigured | AuthError::Signing(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

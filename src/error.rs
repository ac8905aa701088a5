// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
///
/// Every fallible core operation resolves to exactly one of these kinds;
/// storage and signing failures are wrapped into `Fatal` rather than leaking
/// verbatim to clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized request")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Refresh token is expired or already used")]
    TokenReuse,

    #[error("Internal server error")]
    Fatal(#[from] anyhow::Error),
}

/// JSON error envelope: `{ statusCode, data, message, success, errors? }`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    data: Option<()>,
    message: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated | AppError::InvalidToken | AppError::TokenReuse => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Fatal(err) = &self {
            tracing::error!(error = %err, "Internal server error");
        }

        let status = self.status_code();
        let body = ErrorBody {
            status_code: status.as_u16(),
            data: None,
            message: self.to_string(),
            success: false,
            errors: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

//! Mapping of domain errors onto HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use codenames::{ErrorKind, GameError, words::WordError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by every API handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RuleViolation => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            tracing::error!(error = %err, "Game operation failed");
        } else {
            tracing::debug!(error = %err, "Game request rejected");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<WordError> for ApiError {
    fn from(err: WordError) -> Self {
        match err {
            WordError::EmptyWord => Self::bad_request(err.to_string()),
            WordError::Database(ref e) => {
                tracing::error!(error = %e, "Word repository failure");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: err.client_message(),
                }
            }
        }
    }
}

/// Malformed bodies keep axum's status (400, 415 or 422) but answer with
/// the usual `{"error": ...}` document.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Request body rejected");
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced to HTTP callers. Messages never carry internal detail.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Username or email already registered")]
    DuplicateIdentity,

    // Same text as `Unauthenticated`; callers must not tell a failed login
    // from a failed token check.
    #[error("Invalid authentication credentials")]
    InvalidCredentials,

    #[error("Invalid authentication credentials")]
    Unauthenticated,

    #[error("Amount must be a non-negative number")]
    InvalidAmount,

    #[error("{0}")]
    Validation(String),

    /// Body that is not JSON, or not sent as JSON.
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateIdentity | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::InvalidAmount | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        match self {
            AppError::InvalidCredentials | AppError::Unauthenticated => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        // serde's message names internals; keep it in the logs only.
        warn!(reason = %rejection.body_text(), "request body rejected");
        match rejection {
            JsonRejection::JsonDataError(_) => {
                AppError::Validation("Request body has missing or invalid fields".into())
            }
            JsonRejection::MissingJsonContentType(_) => {
                AppError::BadRequest("Expected a JSON request body")
            }
            _ => AppError::BadRequest("Malformed JSON request body"),
        }
    }
}

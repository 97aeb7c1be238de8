//! Error types for the docfill server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docfill_core::DocfillError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing multipart field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("No key: value pairs found in the base document")]
    NoValues,

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
            ServerError::Unsupported(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT"),
            ServerError::NoValues => (StatusCode::UNPROCESSABLE_ENTITY, "NO_VALUES"),
            ServerError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "MISSING_DEPENDENCY"),
            ServerError::Document(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DOCUMENT_ERROR"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DocfillError> for ServerError {
    fn from(err: DocfillError) -> Self {
        match err {
            DocfillError::UnsupportedFormat(tag) => ServerError::Unsupported(tag),
            DocfillError::MissingDependency(_) => ServerError::Unavailable(err.to_string()),
            DocfillError::ReadError(msg) => ServerError::Document(msg),
            DocfillError::WriteError(msg) => ServerError::Internal(msg),
        }
    }
}

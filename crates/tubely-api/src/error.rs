//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use tubely_firestore::FirestoreError;
use tubely_media::MediaError;
use tubely_storage::StorageError;

use crate::services::IngestError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Metadata error: {0}")]
    Metadata(FirestoreError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Metadata(_)
            | ApiError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<FirestoreError> for ApiError {
    fn from(err: FirestoreError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else {
            Self::Metadata(err)
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidContentType(msg) | IngestError::InvalidBody(msg) => {
                Self::BadRequest(msg)
            }
            IngestError::UnsupportedMediaType(media_type) => {
                Self::Validation(format!("Unsupported media type: {}", media_type))
            }
            IngestError::NotFound(id) => Self::NotFound(format!("Video {} not found", id)),
            IngestError::Forbidden(id) => {
                Self::Forbidden(format!("Not the owner of video {}", id))
            }
            IngestError::TooLarge { limit } => {
                Self::PayloadTooLarge(format!("Upload exceeds the {} byte limit", limit))
            }
            IngestError::Staging(e) | IngestError::Processing(e) => Self::Media(e),
            IngestError::Upload(e) => Self::Storage(e),
            IngestError::Metadata(e) => Self::Metadata(e),
            e @ (IngestError::Timeout(_) | IngestError::Unavailable(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Message sent in place of a server error's detail.
pub const INTERNAL_ERROR_DETAIL: &str = "An internal error occurred";

/// Full text of a server error, attached to the redacted response.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

/// JSON `{detail}` error body.
pub(crate) fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { detail })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if !self.is_internal() {
            return error_response(status, self.to_string());
        }

        // Redacted unless the error-detail layer is told otherwise
        error!(error = %self, "Request failed");
        let mut response = error_response(status, INTERNAL_ERROR_DETAIL.to_string());
        response
            .extensions_mut()
            .insert(InternalErrorDetail(self.to_string()));
        response
    }
}

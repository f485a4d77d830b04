//! HTTP error responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{domain::RoomError, infrastructure::dto::http::ErrorResponse};

/// Errors returned by the HTTP API, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The request body could not be decoded.
    #[error("malformed request body")]
    MalformedBody,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection);
        ApiError::MalformedBody
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody => StatusCode::BAD_REQUEST,
            ApiError::Room(e) => match e {
                RoomError::RoomNotFound | RoomError::NotFound(_) => StatusCode::NOT_FOUND,
                RoomError::IncorrectSecret | RoomError::Forbidden(_) => StatusCode::FORBIDDEN,
                RoomError::RoomExists | RoomError::RoomFull | RoomError::StaleSnapshot { .. } => {
                    StatusCode::CONFLICT
                }
                RoomError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                RoomError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RoomError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

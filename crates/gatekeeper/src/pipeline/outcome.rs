//! Result-to-response translation.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::ApiError;

/// Successful pipeline result, independent of transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 200 with a JSON payload.
    Found(Value),
    /// 404.
    NotFound,
    /// 200 with no payload (the record was removed).
    Removed,
}

impl Outcome {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Found(_) | Self::Removed => StatusCode::OK,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Absent result is not-found; anything else is returned as JSON.
pub fn found<T: Serialize>(result: Option<T>) -> Result<Outcome, ApiError> {
    match result {
        Some(value) => serde_json::to_value(value)
            .map(Outcome::Found)
            .map_err(|e| ApiError::Internal(e.to_string())),
        None => Ok(Outcome::NotFound),
    }
}

/// Like [`found`], except that an absent record after a write means the
/// write removed it.
pub fn written<T: Serialize>(result: Option<T>) -> Result<Outcome, ApiError> {
    match result {
        Some(value) => found(Some(value)),
        None => Ok(Outcome::Removed),
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Self::Found(value) => (StatusCode::OK, Json(value)).into_response(),
            Self::Removed => StatusCode::OK.into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "code": 404, "message": "not found" })),
            )
                .into_response(),
        }
    }
}

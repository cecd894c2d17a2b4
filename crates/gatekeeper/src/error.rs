//! HTTP-facing errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::broker::BrokerError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No caller identity could be resolved.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A permission guard denied the request.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Guard denials share the 401 of a failed identity check.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::Forbidden(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BrokerError> for ApiError {
    fn from(e: BrokerError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Unauthorized(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "internal server error".to_string()
            }
            Self::Unauthorized(detail) | Self::Forbidden(detail) => {
                warn!(reason = %detail, "Request denied");
                "unauthorized".to_string()
            }
            Self::BadRequest(detail) => detail.clone(),
        };
        (status, Json(json!({ "code": status.as_u16(), "message": message }))).into_response()
    }
}

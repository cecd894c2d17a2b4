//! HTTP surface of the Gatekeeper service.

use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthError, Identity, IdentityProvider, session_token};
use crate::error::ApiError;
use crate::pipeline::{Gatekeeper, Outcome};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gatekeeper: Gatekeeper,
    pub identity: Arc<dyn IdentityProvider>,
    pub version: String,
}

/// The authenticated caller of a request.
pub struct Caller(pub Identity);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = session_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let identity = state.identity.resolve(token).await?;
        Ok(Self(identity))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/access/status", get(status))
        .route("/access/groups/{userid}", get(groups_for_grantee))
        .route("/access/{userid}", get(groups_for_subject))
        .route(
            "/access/{userid}/{granteeid}",
            get(get_permission).post(set_permission),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /status` and `GET /access/status`, unauthenticated.
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "OK", "version": state.version }))
}

/// `GET /access/groups/{userid}`: whose data the user can access.
pub async fn groups_for_grantee(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Outcome, ApiError> {
    state
        .gatekeeper
        .list_groups_for_grantee(&caller, &user_id)
        .await
}

/// `GET /access/{userid}`: who can access the user's data.
pub async fn groups_for_subject(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Outcome, ApiError> {
    state
        .gatekeeper
        .list_groups_for_subject(&caller, &user_id)
        .await
}

/// `GET /access/{userid}/{granteeid}`
pub async fn get_permission(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path((subject_id, grantee_id)): Path<(String, String)>,
) -> Result<Outcome, ApiError> {
    state
        .gatekeeper
        .get_permission(&caller, &subject_id, &grantee_id)
        .await
}

/// `POST /access/{userid}/{granteeid}`
pub async fn set_permission(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path((subject_id, grantee_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Outcome, ApiError> {
    state
        .gatekeeper
        .set_permission(&caller, &subject_id, &grantee_id, &body)
        .await
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

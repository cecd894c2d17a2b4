//! Caller identity for Gatekeeper requests.
//!
//! Session tokens are JWTs carried in the `x-tidepool-session-token`
//! header (or a bearer `Authorization` header). Resolution turns a token
//! into an [`Identity`]: the caller's user id plus whether it is a
//! service-to-service caller.

pub mod claims;
pub mod token;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};

pub use claims::Claims;
pub use token::TokenManager;

/// Header carrying the session token.
pub const SESSION_TOKEN_HEADER: &str = "x-tidepool-session-token";

/// Resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub is_server: bool,
}

impl Identity {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_server: false,
        }
    }

    pub fn server(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_server: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing session token")]
    MissingToken,

    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Session token has no user")]
    MissingUser,
}

/// Turns a session token into a caller identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Identity, AuthError>;
}

#[async_trait]
impl IdentityProvider for TokenManager {
    async fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.validate(token)?;
        if claims.usr.is_empty() {
            return Err(AuthError::MissingUser);
        }
        Ok(Identity {
            is_server: claims.is_server(),
            user_id: claims.usr,
        })
    }
}

/// Extract the session token from request headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return Some(token);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|v| !v.is_empty())
}

//! Session token claims.

use serde::{Deserialize, Serialize};

/// Marker value of `svr` for service-to-service tokens.
pub const SERVER_MARKER: &str = "yes";

/// JWT claims embedded in session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// User ID the session belongs to.
    pub usr: String,
    /// `"yes"` for service tokens, `"no"` otherwise.
    pub svr: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn is_server(&self) -> bool {
        self.svr == SERVER_MARKER
    }
}

//! Request body normalization.

use gatekeeper_core::Permissions;

use crate::error::ApiError;

/// Parse a submitted permission body.
///
/// A zero-length payload is the empty record, which makes "grant nothing"
/// (revoke) expressible without a body. `root` is never grantable.
pub fn normalize(raw: &[u8]) -> Result<Permissions, ApiError> {
    if raw.is_empty() {
        return Ok(Permissions::default());
    }
    let permissions =
        Permissions::from_json(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    permissions
        .validate_grant()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(permissions)
}

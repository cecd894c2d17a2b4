//! Session token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use super::claims::{Claims, SERVER_MARKER};
use super::AuthError;

/// Issues and validates HS256 session tokens.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenManager {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a session token for `user_id`, valid for `ttl_secs`.
    pub fn issue(&self, user_id: &str, is_server: bool, ttl_secs: i64) -> Result<String, AuthError> {
        let now = gatekeeper_core::db::unix_timestamp();
        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            usr: user_id.to_string(),
            svr: if is_server { SERVER_MARKER } else { "no" }.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

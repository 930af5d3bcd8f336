//! Issuer-side token encoding.
//!
//! Production tokens come from the platform's identity service; this
//! encoder mirrors its claim layout so integration tests and local
//! development can mint compatible tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use cinesync_core::config::auth::AuthConfig;
use cinesync_core::error::AppError;
use cinesync_core::types::id::UserId;

use super::claims::Claims;

/// Encodes identity tokens with the shared HMAC secret.
#[derive(Clone)]
pub struct TokenEncoder {
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for TokenEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEncoder").finish()
    }
}

impl TokenEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Issues a token for `user_id` valid for `ttl_seconds` (negative for
    /// an already-expired token, useful in tests).
    pub fn issue(
        &self,
        user_id: UserId,
        username: &str,
        ttl_seconds: i64,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.into_uuid(),
            name: username.to_string(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(cinesync_core::error::ErrorKind::Internal,
                format!("Failed to encode token: {e}"), e))
    }
}

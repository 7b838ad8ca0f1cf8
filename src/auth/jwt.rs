use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

/// Validity window of an issued token
pub const TOKEN_TTL_HOURS: i64 = 2;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("JWT signing key is not configured")]
    SigningKeyNotConfigured,

    #[error("Missing Authorization header or not in 'Bearer <token>' form")]
    MalformedHeader,

    #[error("Invalid JWT token: {0}")]
    Unauthenticated(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Token claims: `{"userId": <int>, "exp": <unix seconds>}`
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "userId")]
    user_id: i64,
    exp: i64,
}

/// Issues and verifies HMAC-signed, expiring identity tokens.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self::from_secret(config.jwt_secret.as_deref())
    }

    pub fn from_secret(secret: Option<&str>) -> Self {
        Self {
            secret: secret
                .filter(|s| !s.is_empty())
                .map(|s| s.as_bytes().to_vec()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Issue a token for `user_id` that expires two hours from now.
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_with_ttl(user_id, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Issue a token with a caller-chosen lifetime. A negative `ttl` yields an
    /// already-expired token.
    pub fn issue_with_ttl(&self, user_id: i64, ttl: Duration) -> Result<String, AuthError> {
        let secret = self.secret.as_ref().ok_or(AuthError::SigningKeyNotConfigured)?;

        let claims = Claims {
            user_id,
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(AuthError::Signing)
    }

    /// Verify signature, algorithm family and expiry, and return the user id.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        let secret = self.secret.as_ref().ok_or(AuthError::SigningKeyNotConfigured)?;

        // Any HMAC variant is accepted; asymmetric and `none` algorithms are not
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;

        Ok(token_data.claims.user_id)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(auth_header: Option<&str>) -> Result<&str, AuthError> {
    auth_header
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MalformedHeader)
}

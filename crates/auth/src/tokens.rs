use chrono::{Duration, Utc};
use dockhand_models::DockhandError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Issue an HS256 access token for a username.
pub fn issue_token(
    username: &str,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String, DockhandError> {
    let claims = Claims {
        sub: username.to_string(),
        exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| DockhandError::InternalError {
        reason: e.to_string(),
    })
}

/// Decode and validate a token. Expired or tampered tokens are rejected.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, DockhandError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| DockhandError::InvalidToken)
}

/// The cookie and header both carry "Bearer <token>".
pub fn strip_bearer(value: &str) -> Option<&str> {
    value.strip_prefix("Bearer ").map(str::trim)
}

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthError;

/// The JWT payload. `exp`/`iat` are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub exp: i64,
    pub iat: i64,
    pub sub: Uuid,
    pub login: String,
}

/// Body of `POST /v1/auth/token`'s success response.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// HS256-signs a `Token` for `user_id`/`login`, expiring `ttl_seconds`
/// from now.
pub fn encode_jwt_token(
    user_id: Uuid,
    login: &str,
    secret: &[u8],
    ttl_seconds: i64,
) -> Result<TokenResponse, AuthError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::seconds(ttl_seconds);

    let token = Token {
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
        sub: user_id,
        login: login.to_string(),
    };

    let access_token = encode(&Header::new(Algorithm::HS256), &token, &EncodingKey::from_secret(secret))
        .map_err(|_| AuthError::TokenEncoding)?;

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: ttl_seconds,
        expires_at,
    })
}

/// Decodes and validates a JWT, returning its payload. Any signature
/// mismatch, malformed token, or expiry (`exp` in the past) is
/// `AuthError::InvalidToken`.
pub fn decode_jwt_token(encoded_token: &str, secret: &[u8]) -> Result<Token, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Token>(encoded_token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

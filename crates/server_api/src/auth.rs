//! Admin bearer tokens: HS256 JWTs signed with a shared secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{ApiError, ErrorCode};

#[derive(Debug, Clone)]
pub struct AdminTokenConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub role: String,
}

const ADMIN_ROLE: &str = "admin";

pub fn mint_admin_token(
    cfg: &AdminTokenConfig,
    subject: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = AdminClaims {
        sub: subject.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        role: ADMIN_ROLE.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

pub fn verify_admin_token(secret: &str, token: &str) -> Result<AdminClaims, ApiError> {
    let data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| ApiError::new(ErrorCode::Unauthorized, format!("invalid token: {e}")))?;

    if data.claims.role != ADMIN_ROLE {
        return Err(ApiError::new(
            ErrorCode::Forbidden,
            "token does not grant admin access",
        ));
    }
    Ok(data.claims)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;

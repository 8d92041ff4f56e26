use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config;

/// Session token claims. The system supports exactly one administrator
/// identity, so `is_admin` is always true on minted tokens; verification
/// still checks it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn admin(username: String) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self {
            username,
            is_admin: true,
            exp: (now + Duration::hours(expiry_hours as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("JWT secret not configured")]
    MissingSecret,
}

pub fn generate_token(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Verify a token and require the admin claim.
pub fn verify_token(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    if !data.claims.is_admin {
        return Err(AuthError::InvalidToken);
    }
    Ok(data.claims)
}

/// Check a login password against the configured credential.
///
/// With ADMIN_PASSWORD_HASH set ("salt:sha256hex") the comparison is a salted
/// hash; otherwise the development fallback password is compared directly.
pub fn verify_password(password: &str) -> bool {
    let security = &config::config().security;

    match &security.admin_password_hash {
        Some(stored) => match stored.split_once(':') {
            Some((salt, hex)) => hash_password(salt, password) == hex.to_lowercase(),
            None => false,
        },
        None => {
            !security.admin_dev_password.is_empty() && password == security.admin_dev_password
        }
    }
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

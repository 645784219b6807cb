use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{User, UserRole};

/// Claims embedded in the JWT access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // subject id
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Claims embedded in the JWT refresh token. Expiry metadata only, no identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshClaims {
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Identity fields a token pair is minted from.
#[derive(Debug, Clone)]
pub struct ClaimsInput {
    pub subject_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl From<&User> for ClaimsInput {
    fn from(u: &User) -> Self {
        Self {
            subject_id: u.user_id.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            role: u.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
}

/// Extracted from the validated JWT, available via Axum extractors
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub subject_id: String,
    pub email: String,
    pub role: UserRole,
}

impl From<Claims> for AuthenticatedUser {
    fn from(c: Claims) -> Self {
        Self {
            subject_id: c.sub,
            email: c.email,
            role: c.role,
        }
    }
}

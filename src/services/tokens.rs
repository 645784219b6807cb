//! Minting and checking HS256 session tokens.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use uuid::Uuid;

use crate::{
    error::TokenError,
    models::auth::{Claims, ClaimsInput, RefreshClaims, TokenPair},
};

/// Keys derived once from the process-wide secret and shared by issuer and validator.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<TokenKeys>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(keys: Arc<TokenKeys>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self { keys, access_ttl, refresh_ttl }
    }

    pub fn issue(&self, input: &ClaimsInput) -> anyhow::Result<TokenPair> {
        self.issue_at(input, Utc::now())
    }

    /// Mints an access token carrying the identity and a refresh token carrying
    /// only expiry metadata, both signed with the same key.
    pub fn issue_at(&self, input: &ClaimsInput, now: DateTime<Utc>) -> anyhow::Result<TokenPair> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: input.subject_id.clone(),
            email: input.email.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            role: input.role,
            iat,
            exp: (now + self.access_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let refresh_claims = RefreshClaims {
            iat,
            exp: (now + self.refresh_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &claims, &self.keys.encoding)
            .context("Failed to sign access token")?;
        let refresh_token = encode(&header, &refresh_claims, &self.keys.encoding)
            .context("Failed to sign refresh token")?;

        Ok(TokenPair { access_token, refresh_token, issued_at: now })
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<TokenKeys>,
}

impl TokenValidator {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }

    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        self.parse_at(token, Utc::now().timestamp())
    }

    /// Verifies signature and algorithm, then expiry against `now` (unix seconds).
    /// A token whose `exp` equals `now` is already expired.
    pub fn parse_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode_verified::<Claims>(token, &self.keys.decoding)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Checks a refresh token's signature and expiry. No endpoint exchanges
    /// refresh tokens yet; this is the verification half of that contract.
    pub fn parse_refresh_at(&self, token: &str, now: i64) -> Result<RefreshClaims, TokenError> {
        let claims = decode_verified::<RefreshClaims>(token, &self.keys.decoding)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

fn decode_verified<T: serde::de::DeserializeOwned>(
    token: &str,
    key: &DecodingKey,
) -> Result<T, TokenError> {
    // Expiry is checked by the caller with an inclusive boundary and no leeway.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    decode::<T>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::Malformed,
        })
}

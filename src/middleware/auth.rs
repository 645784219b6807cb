use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    services::metrics::TOKEN_REJECTIONS_COUNTER,
    AppState,
};

/// Legacy header some clients still send the raw token in.
const LEGACY_TOKEN_HEADER: &str = "token";

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = state.validator.parse(token).map_err(|e| {
            TOKEN_REJECTIONS_COUNTER.with_label_values(&[e.label()]).inc();
            tracing::debug!(reason = e.label(), "bearer token rejected");
            ApiError::Token(e)
        })?;

        Ok(claims.into())
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    if let Some(header) = parts.headers.get("Authorization") {
        let value = header
            .to_str()
            .map_err(|_| ApiError::Auth("Invalid Authorization header format".into()))?;
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Auth("Invalid Authorization header format".into()));
    }

    parts
        .headers
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Auth("Missing Authorization header".into()))
}

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    middleware::json::ApiJson,
    models::user::{LoginRequest, LoginResponse, SignupRequest, SignupResponse},
    services::metrics::{outcome, LOGINS_COUNTER, SIGNUPS_COUNTER},
    AppState,
};

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let result = state.accounts.signup(body).await;
    SIGNUPS_COUNTER.with_label_values(&[outcome(&result)]).inc();

    let user = result?;
    Ok((StatusCode::CREATED, Json(SignupResponse { inserted_id: user.user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = state.accounts.login(&body.email, &body.password).await;
    LOGINS_COUNTER.with_label_values(&[outcome(&result)]).inc();
    result.map(Json)
}

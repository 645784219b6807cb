use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{
        auth::AuthenticatedUser,
        user::{ListUsersQuery, UserPage, UserProfile},
    },
    AppState,
};

/// List identities, one page at a time (ADMIN only).
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserPage>, ApiError> {
    let (offset, limit) = query.window();
    state.accounts.list(&user, offset, limit).await.map(Json)
}

/// Fetch one identity; a USER may only fetch their own.
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let found = state.accounts.get_by_id(&user_id, &user).await?;
    Ok(Json(found.into()))
}

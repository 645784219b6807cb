pub mod auth;
pub mod health;
pub mod metrics;
pub mod users;

use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("token"),
        ]))
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::get_user))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

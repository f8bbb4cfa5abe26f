use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower::ServiceBuilder;
use axum::extract::DefaultBodyLimit;

use super::handlers::*;
use super::AppState;

pub fn create_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/crs/compound", get(get_compound))
        .route("/api/crs/:id", get(get_crs))
        .route("/api/shift", get(get_shift))
        .route("/api/shift/batch", post(shift_batch))
        .route("/api/directory", post(describe_directory))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

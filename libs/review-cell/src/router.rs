use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn review_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_reviews))
        .route("/summary", get(handlers::review_summary))
        .route("/{review_id}", get(handlers::get_review));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_review))
        .route(
            "/{review_id}",
            put(handlers::update_review).delete(handlers::delete_review),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

pub fn favorite_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_favorites))
        .route("/toggle", post(handlers::toggle_favorite))
        .route("/{favorite_id}", delete(handlers::delete_favorite))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn account_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/users", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/verify-otp", post(handlers::verify_otp))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password", post(handlers::reset_password))
        .route("/resend-otp", post(handlers::resend_otp))
        .route("/token/verify", post(handlers::verify_token))
        .route("/token/validate", post(handlers::validate_token));

    let protected_routes = Router::new()
        .route("/users", get(handlers::list_users))
        .route(
            "/users/{user_id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/me", get(handlers::get_current_user))
        .route("/change-password", post(handlers::change_password))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

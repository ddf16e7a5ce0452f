use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Categories, hospitals, doctors, working times and counts, mounted at the root.
pub fn directory_routes(state: Arc<AppConfig>) -> Router {
    // Reads are public
    let public_routes = Router::new()
        .route("/categories", get(handlers::list_categories))
        .route("/categories/{category_id}", get(handlers::get_category))
        .route("/hospitals", get(handlers::list_hospitals))
        .route("/hospitals/{hospital_id}", get(handlers::get_hospital))
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/working-times", get(handlers::list_working_times))
        .route("/working-times/{working_time_id}", get(handlers::get_working_time))
        .route("/directory/counts", get(handlers::directory_counts));

    // Writes need an administrator token
    let protected_routes = Router::new()
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/{category_id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route("/hospitals", post(handlers::create_hospital))
        .route(
            "/hospitals/{hospital_id}",
            put(handlers::update_hospital).delete(handlers::delete_hospital),
        )
        .route("/hospitals/{hospital_id}/image", post(handlers::upload_hospital_image))
        .route("/doctors", post(handlers::create_doctor))
        .route(
            "/doctors/{doctor_id}",
            put(handlers::update_doctor).delete(handlers::delete_doctor),
        )
        .route("/doctors/{doctor_id}/image", post(handlers::upload_doctor_image))
        .route("/working-times", post(handlers::create_working_time))
        .route(
            "/working-times/{working_time_id}",
            put(handlers::update_working_time).delete(handlers::delete_working_time),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

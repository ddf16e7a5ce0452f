use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::{appointment_routes, package_routes};
use auth_cell::router::account_routes;
use directory_cell::directory_routes;
use patient_cell::patient_routes;
use review_cell::{favorite_routes, review_routes};
use shared_config::AppConfig;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "careconnect-api" }))
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/accounts", account_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/favorites", favorite_routes(state.clone()))
        .nest("/doctor-packages", package_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        // Categories, hospitals, doctors and working times live at the root
        .merge(directory_routes(state))
}

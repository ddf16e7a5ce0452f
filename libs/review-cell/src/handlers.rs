use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::request::{document_id, json_body};

use crate::models::{
    CreateReviewRequest, EntityFilter, FavoriteDetail, Review, ReviewSummary, ToggleFavoriteRequest,
    ToggleFavoriteResponse, UpdateReviewRequest,
};
use crate::services::{FavoriteService, ReviewService};

// ==============================================================================
// REVIEWS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_reviews(
    State(state): State<Arc<AppConfig>>,
    Query(filter): Query<EntityFilter>,
) -> Result<Json<Vec<Review>>, AppError> {
    let service = ReviewService::new(&state);
    Ok(Json(service.list_reviews(&filter).await?))
}

#[axum::debug_handler]
pub async fn review_summary(
    State(state): State<Arc<AppConfig>>,
    Query(filter): Query<EntityFilter>,
) -> Result<Json<ReviewSummary>, AppError> {
    let (Some(entity_id), Some(entity_type)) = (filter.entity_id, filter.entity_type) else {
        return Err(AppError::BadRequest("entity_id and entity_type are required".to_string()));
    };

    let service = ReviewService::new(&state);
    Ok(Json(service.summary(entity_type, entity_id).await?))
}

#[axum::debug_handler]
pub async fn get_review(
    State(state): State<Arc<AppConfig>>,
    Path(review_id): Path<String>,
) -> Result<Json<Review>, AppError> {
    let id = document_id(&review_id, "Review")?;
    let service = ReviewService::new(&state);
    Ok(Json(service.get_review(id).await?))
}

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let request = json_body(payload)?;
    let service = ReviewService::new(&state);
    let review = service.create_review(request, &user).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[axum::debug_handler]
pub async fn update_review(
    State(state): State<Arc<AppConfig>>,
    Path(review_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> Result<Json<Review>, AppError> {
    let id = document_id(&review_id, "Review")?;
    let request = json_body(payload)?;
    let service = ReviewService::new(&state);
    Ok(Json(service.update_review(id, request, &user).await?))
}

#[axum::debug_handler]
pub async fn delete_review(
    State(state): State<Arc<AppConfig>>,
    Path(review_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    let id = document_id(&review_id, "Review")?;
    let service = ReviewService::new(&state);
    service.delete_review(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// FAVORITES
// ==============================================================================

#[axum::debug_handler]
pub async fn toggle_favorite(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ToggleFavoriteRequest>, JsonRejection>,
) -> Result<Json<ToggleFavoriteResponse>, AppError> {
    let request = json_body(payload)?;
    let service = FavoriteService::new(&state);
    Ok(Json(service.toggle(request, &user).await?))
}

#[axum::debug_handler]
pub async fn list_favorites(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FavoriteDetail>>, AppError> {
    let service = FavoriteService::new(&state);
    Ok(Json(service.list_favorites(&user).await?))
}

#[axum::debug_handler]
pub async fn delete_favorite(
    State(state): State<Arc<AppConfig>>,
    Path(favorite_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let id = document_id(&favorite_id, "Favorite item")?;
    let service = FavoriteService::new(&state);
    service.delete_favorite(id, &user).await?;
    Ok(Json(json!({ "message": "Favorite item removed successfully" })))
}

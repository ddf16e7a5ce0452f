use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::entity::EntityType;
use shared_models::error::AppError;
use shared_utils::media::{FileUpload, MediaError};

pub const REVIEWS: &str = "reviews";
pub const FAVORITES: &str = "favorites";

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity_id: Uuid,
    pub entity_type: EntityType,
    pub rating: u8,
    pub review: Option<String>,
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReviewRequest {
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<EntityType>,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub file: Option<FileUpload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub file: Option<FileUpload>,
}

/// Filter shared by the review list and summary endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityFilter {
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<EntityType>,
}

/// Count and mean rating for one entity. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub review_count: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity_id: Uuid,
    pub entity_type: EntityType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<EntityType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleFavoriteResponse {
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<Favorite>,
}

/// A favorite with the doctor or hospital it points at.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteDetail {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub entity: Option<Value>,
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Review not found")]
    NotFound,

    #[error("Favorite item not found")]
    FavoriteNotFound,

    #[error("{} not found", .0.label())]
    EntityNotFound(EntityType),

    #[error("Only the author can modify this review")]
    NotAuthor,

    #[error("Not authorized to remove this favorite")]
    NotOwner,

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ReviewError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ReviewError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound | ReviewError::FavoriteNotFound | ReviewError::EntityNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ReviewError::NotAuthor | ReviewError::NotOwner => AppError::Auth(err.to_string()),
            ReviewError::Validation { field, message } => AppError::field(&field, message),
            ReviewError::Media(e) => e.into(),
            ReviewError::Database(e) => e.into(),
        }
    }
}

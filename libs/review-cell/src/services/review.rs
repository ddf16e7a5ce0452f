use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::auth::AuthUser;
use shared_models::entity::EntityType;
use shared_utils::media::MediaStorage;

use crate::models::{
    CreateReviewRequest, EntityFilter, Review, ReviewError, ReviewSummary, UpdateReviewRequest,
    MAX_RATING, MIN_RATING, REVIEWS,
};
use crate::services::aggregate::summarize;

type Result<T> = std::result::Result<T, ReviewError>;

const REVIEW_MEDIA: &str = "reviews";

pub fn checked_rating(rating: i64) -> Result<u8> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ReviewError::validation(
            "rating",
            format!("Rating must be between {} and {}.", MIN_RATING, MAX_RATING),
        ));
    }
    Ok(rating as u8)
}

fn caller_id(caller: &AuthUser) -> Result<Uuid> {
    Uuid::parse_str(&caller.id).map_err(|_| ReviewError::NotAuthor)
}

/// True when a doctor or hospital with `entity_id` exists.
pub async fn entity_exists(db: &DatabaseClient, entity_type: EntityType, entity_id: Uuid) -> Result<bool> {
    Ok(db
        .exists(entity_type.collection(), &Query::new().eq("id", entity_id))
        .await?)
}

pub struct ReviewService {
    db: DatabaseClient,
    media: MediaStorage,
}

impl ReviewService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
            media: MediaStorage::new(config),
        }
    }

    pub async fn create_review(&self, request: CreateReviewRequest, caller: &AuthUser) -> Result<Review> {
        let entity_id = request
            .entity_id
            .ok_or_else(|| ReviewError::validation("entity_id", "This field is required."))?;
        let entity_type = request
            .entity_type
            .ok_or_else(|| ReviewError::validation("entity_type", "This field is required."))?;
        let rating = request
            .rating
            .ok_or_else(|| ReviewError::validation("rating", "This field is required."))
            .and_then(checked_rating)?;

        debug!("User {} reviewing {} {}", caller.id, entity_type.label(), entity_id);

        if !entity_exists(&self.db, entity_type, entity_id).await? {
            return Err(ReviewError::EntityNotFound(entity_type));
        }

        let review_id = Uuid::new_v4();
        let file = match &request.file {
            Some(upload) => Some(self.media.store(REVIEW_MEDIA, &review_id.to_string(), upload).await?),
            None => None,
        };

        let now = Utc::now().to_rfc3339();
        let document = json!({
            "id": review_id,
            "user_id": caller_id(caller)?,
            "entity_id": entity_id,
            "entity_type": entity_type,
            "rating": rating,
            "review": request.review,
            "file": file,
            "created_at": now,
            "updated_at": now
        });

        match self.db.insert::<Review, _>(REVIEWS, &document).await {
            Ok(review) => {
                info!("Review {} created for {} {}", review.id, entity_type.label(), entity_id);
                Ok(review)
            }
            Err(e) => {
                if let Some(reference) = file {
                    self.media.remove(&reference).await;
                }
                Err(e.into())
            }
        }
    }

    pub async fn list_reviews(&self, filter: &EntityFilter) -> Result<Vec<Review>> {
        let mut query = Query::new().order("created_at.desc");
        if let Some(entity_id) = filter.entity_id {
            query = query.eq("entity_id", entity_id);
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.eq("entity_type", entity_type);
        }
        Ok(self.db.select(REVIEWS, &query).await?)
    }

    pub async fn get_review(&self, review_id: Uuid) -> Result<Review> {
        self.db
            .select_one(REVIEWS, &Query::new().eq("id", review_id))
            .await?
            .ok_or(ReviewError::NotFound)
    }

    pub async fn update_review(
        &self,
        review_id: Uuid,
        request: UpdateReviewRequest,
        caller: &AuthUser,
    ) -> Result<Review> {
        let existing = self.get_review(review_id).await?;
        if existing.user_id.to_string() != caller.id {
            return Err(ReviewError::NotAuthor);
        }

        let mut update_data = Map::new();
        if let Some(rating) = request.rating {
            update_data.insert("rating".to_string(), json!(checked_rating(rating)?));
        }
        if let Some(review) = request.review {
            update_data.insert("review".to_string(), json!(review));
        }
        let stored = match &request.file {
            Some(upload) => {
                let reference = self.media.store(REVIEW_MEDIA, &review_id.to_string(), upload).await?;
                update_data.insert("file".to_string(), json!(reference));
                Some(reference)
            }
            None => None,
        };
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let outcome = self
            .db
            .update::<Review>(REVIEWS, &Query::new().eq("id", review_id), Value::Object(update_data))
            .await
            .map_err(ReviewError::from)
            .and_then(|mut rows| {
                if rows.is_empty() {
                    Err(ReviewError::NotFound)
                } else {
                    Ok(rows.swap_remove(0))
                }
            });

        // The old attachment goes only once the new one is recorded
        let (obsolete, result) = match outcome {
            Ok(review) => (stored.and(existing.file), Ok(review)),
            Err(e) => (stored, Err(e)),
        };
        if let Some(reference) = obsolete {
            self.media.remove(&reference).await;
        }
        result
    }

    pub async fn delete_review(&self, review_id: Uuid, caller: &AuthUser) -> Result<()> {
        let existing = self.get_review(review_id).await?;
        if !caller.can_access(&existing.user_id.to_string()) {
            return Err(ReviewError::NotAuthor);
        }

        let removed: Vec<Review> = self
            .db
            .delete(REVIEWS, &Query::new().eq("id", review_id))
            .await?;

        let Some(review) = removed.into_iter().next() else {
            return Err(ReviewError::NotFound);
        };
        if let Some(file) = review.file {
            self.media.remove(&file).await;
        }

        info!("Review {} deleted", review_id);
        Ok(())
    }

    pub async fn summary(&self, entity_type: EntityType, entity_id: Uuid) -> Result<ReviewSummary> {
        let reviews = self.reviews_for_entity(entity_type, entity_id).await?;
        Ok(summarize(reviews.iter().map(|r| r.rating)))
    }

    pub async fn reviews_for_entity(&self, entity_type: EntityType, entity_id: Uuid) -> Result<Vec<Review>> {
        let query = Query::new()
            .eq("entity_id", entity_id)
            .eq("entity_type", entity_type)
            .order("created_at.desc");
        Ok(self.db.select(REVIEWS, &query).await?)
    }

    /// All reviews of the given entities in a single read.
    pub async fn reviews_for_entities(&self, entity_type: EntityType, entity_ids: &[Uuid]) -> Result<Vec<Review>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new()
            .in_list("entity_id", entity_ids)
            .eq("entity_type", entity_type);
        Ok(self.db.select(REVIEWS, &query).await?)
    }
}

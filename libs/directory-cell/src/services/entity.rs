//! Operations shared by doctors and hospitals.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use review_cell::models::{FAVORITES, REVIEWS};
use shared_database::{DatabaseClient, Query};
use shared_models::entity::EntityType;
use shared_utils::media::{FileUpload, MediaStorage};

use crate::models::{DirectoryError, WORKING_TIMES};

type Result<T> = std::result::Result<T, DirectoryError>;

/// Removes the working times, reviews and favorites that point at a deleted entity.
pub async fn purge_dependents(db: &DatabaseClient, entity_type: EntityType, entity_id: Uuid) -> Result<()> {
    let owned = Query::new().eq("entity_id", entity_id).eq("entity_type", entity_type);

    for collection in [WORKING_TIMES, REVIEWS, FAVORITES] {
        let removed: Vec<Value> = db.delete(collection, &owned).await?;
        debug!("Removed {} {} of {} {}", removed.len(), collection, entity_type.label(), entity_id);
    }
    Ok(())
}

/// Stores a new image for the entity, points the document at it and drops the old file.
pub async fn replace_image<T>(
    db: &DatabaseClient,
    media: &MediaStorage,
    entity_type: EntityType,
    entity_id: Uuid,
    previous: Option<String>,
    upload: &FileUpload,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let reference = media
        .store(entity_type.collection(), &entity_id.to_string(), upload)
        .await?;

    let rows: Vec<T> = db
        .update(
            entity_type.collection(),
            &Query::new().eq("id", entity_id),
            json!({ "image": reference, "updated_at": Utc::now().to_rfc3339() }),
        )
        .await?;

    let Some(updated) = rows.into_iter().next() else {
        media.remove(&reference).await;
        return Err(DirectoryError::not_found(entity_type));
    };

    if let Some(previous) = previous {
        media.remove(&previous).await;
    }
    info!("{} {} image set to {}", entity_type.label(), entity_id, reference);
    Ok(updated)
}

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::auth::AuthUser;
use shared_models::entity::EntityType;

use crate::models::{
    Favorite, FavoriteDetail, ReviewError, ToggleFavoriteRequest, ToggleFavoriteResponse, FAVORITES,
};
use crate::services::review::entity_exists;

type Result<T> = std::result::Result<T, ReviewError>;

/// What a toggle does given the caller's current favorite for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Add,
    Remove(Uuid),
}

pub fn toggle_action(existing: Option<&Favorite>) -> ToggleAction {
    match existing {
        Some(favorite) => ToggleAction::Remove(favorite.id),
        None => ToggleAction::Add,
    }
}

pub struct FavoriteService {
    db: DatabaseClient,
}

impl FavoriteService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DatabaseClient::new(config),
        }
    }

    fn entity_query(entity_type: EntityType, entity_id: Uuid) -> Query {
        Query::new()
            .eq("entity_id", entity_id)
            .eq("entity_type", entity_type)
    }

    /// Recomputes the entity's `is_favorite` flag from the favorites that exist now.
    pub async fn sync_favorite_flag(&self, entity_type: EntityType, entity_id: Uuid) -> Result<bool> {
        let is_favorite = self
            .db
            .exists(FAVORITES, &Self::entity_query(entity_type, entity_id))
            .await?;

        let _: Vec<Value> = self
            .db
            .update(
                entity_type.collection(),
                &Query::new().eq("id", entity_id),
                json!({ "is_favorite": is_favorite }),
            )
            .await?;

        debug!("{} {} is_favorite = {}", entity_type.label(), entity_id, is_favorite);
        Ok(is_favorite)
    }

    pub async fn toggle(&self, request: ToggleFavoriteRequest, caller: &AuthUser) -> Result<ToggleFavoriteResponse> {
        let entity_id = request
            .entity_id
            .ok_or_else(|| ReviewError::validation("entity_id", "This field is required."))?;
        let entity_type = request
            .entity_type
            .ok_or_else(|| ReviewError::validation("entity_type", "This field is required."))?;
        let user_id = Uuid::parse_str(&caller.id).map_err(|_| ReviewError::NotOwner)?;

        if !entity_exists(&self.db, entity_type, entity_id).await? {
            return Err(ReviewError::EntityNotFound(entity_type));
        }

        let existing: Option<Favorite> = self
            .db
            .select_one(
                FAVORITES,
                &Self::entity_query(entity_type, entity_id).eq("user_id", user_id),
            )
            .await?;

        let response = match toggle_action(existing.as_ref()) {
            ToggleAction::Remove(favorite_id) => {
                let _: Vec<Value> = self
                    .db
                    .delete(FAVORITES, &Query::new().eq("id", favorite_id))
                    .await?;
                info!("User {} unfavorited {} {}", user_id, entity_type.label(), entity_id);
                ToggleFavoriteResponse {
                    is_favorite: false,
                    favorite: None,
                }
            }
            ToggleAction::Add => {
                let favorite: Favorite = self
                    .db
                    .insert(
                        FAVORITES,
                        &json!({
                            "id": Uuid::new_v4(),
                            "user_id": user_id,
                            "entity_id": entity_id,
                            "entity_type": entity_type,
                            "created_at": Utc::now().to_rfc3339()
                        }),
                    )
                    .await?;
                info!("User {} favorited {} {}", user_id, entity_type.label(), entity_id);
                ToggleFavoriteResponse {
                    is_favorite: true,
                    favorite: Some(favorite),
                }
            }
        };

        self.sync_favorite_flag(entity_type, entity_id).await?;
        Ok(response)
    }

    pub async fn list_favorites(&self, caller: &AuthUser) -> Result<Vec<FavoriteDetail>> {
        let favorites: Vec<Favorite> = self
            .db
            .select(
                FAVORITES,
                &Query::new().eq("user_id", &caller.id).order("created_at.desc"),
            )
            .await?;

        let mut entities: HashMap<Uuid, Value> = HashMap::new();
        for entity_type in [EntityType::Doctor, EntityType::Hospital] {
            let ids: Vec<Uuid> = favorites
                .iter()
                .filter(|f| f.entity_type == entity_type)
                .map(|f| f.entity_id)
                .collect();
            if ids.is_empty() {
                continue;
            }

            let rows: Vec<Value> = self
                .db
                .select(entity_type.collection(), &Query::new().in_list("id", &ids))
                .await?;
            for row in rows {
                if let Some(id) = row.get("id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()) {
                    entities.insert(id, row);
                }
            }
        }

        Ok(favorites
            .into_iter()
            .map(|favorite| {
                let entity = entities.get(&favorite.entity_id).cloned();
                FavoriteDetail { favorite, entity }
            })
            .collect())
    }

    pub async fn delete_favorite(&self, favorite_id: Uuid, caller: &AuthUser) -> Result<()> {
        let favorite: Favorite = self
            .db
            .select_one(FAVORITES, &Query::new().eq("id", favorite_id))
            .await?
            .ok_or(ReviewError::FavoriteNotFound)?;

        if !caller.can_access(&favorite.user_id.to_string()) {
            return Err(ReviewError::NotOwner);
        }

        let removed: Vec<Value> = self
            .db
            .delete(FAVORITES, &Query::new().eq("id", favorite_id))
            .await?;
        if removed.is_empty() {
            return Err(ReviewError::FavoriteNotFound);
        }

        self.sync_favorite_flag(favorite.entity_type, favorite.entity_id).await?;
        info!("Favorite {} removed", favorite_id);
        Ok(())
    }
}
